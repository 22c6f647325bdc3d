use crate::canonicalize::{DocumentLoader, RdfCanonicalizer, SelectiveCanonicalizer};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::key::Curve;
use crate::proof::{ProofOptions, VerificationResult};
use crate::verification::VerificationMethodResolver;

/// Trait defining the main interface for cryptographic suites
pub trait CryptoSuite {
    /// Name of the cryptographic suite
    fn name(&self) -> &'static str;

    /// Curve the suite signs and verifies on
    fn curve(&self) -> Curve;

    /// Create a proof for a document with given options
    fn create_proof(&self, document: &Document, options: &ProofOptions) -> Result<Document>;

    /// Verify a document with a proof
    fn verify_proof(&self, document: &Document) -> Result<VerificationResult>;
}

/// Factory function to instantiate a cryptosuite by name
pub fn instantiate_cryptosuite<'a>(
    cryptosuite: &str,
    curve: Curve,
    canonicalizer: &'a dyn RdfCanonicalizer,
    selective: &'a dyn SelectiveCanonicalizer,
    loader: &'a dyn DocumentLoader,
    resolver: &'a dyn VerificationMethodResolver,
) -> Result<Box<dyn CryptoSuite + 'a>> {
    match cryptosuite {
        "ecdsa-rdfc-2019" => {
            use crate::suites::ecdsa_rdfc::EcdsaRdfcSuite;
            Ok(Box::new(EcdsaRdfcSuite::new(
                curve,
                canonicalizer,
                loader,
                resolver,
            )))
        }
        "ecdsa-jcs-2019" => {
            use crate::suites::ecdsa_jcs::EcdsaJcsSuite;
            Ok(Box::new(EcdsaJcsSuite::new(curve, resolver)))
        }
        "ecdsa-sd-2023" => {
            use crate::suites::ecdsa_sd::EcdsaSdSuite;
            Ok(Box::new(EcdsaSdSuite::new(
                curve,
                canonicalizer,
                selective,
                loader,
                resolver,
            )))
        }
        _ => Err(Error::ProofTransformation(format!(
            "unsupported cryptosuite: {cryptosuite}"
        ))),
    }
}
