use crate::cryptosuite::CryptoSuite;
use crate::document::Document;
use crate::error::Result;
use crate::key::Curve;
use crate::proof::{ProofOptions, VerificationResult};
use crate::suites::pipeline::{SuitePipeline, Transformation};
use crate::verification::VerificationMethodResolver;

/// The `ecdsa-jcs-2019` cryptographic suite.
///
/// Canonicalizes documents and proof configurations with the JSON
/// Canonicalization Scheme (RFC 8785) and signs the concatenated digests
/// with ECDSA on the configured curve.
pub struct EcdsaJcsSuite<'a> {
    curve: Curve,
    resolver: &'a dyn VerificationMethodResolver,
}

impl<'a> EcdsaJcsSuite<'a> {
    /// Create a new ECDSA JCS suite
    pub fn new(curve: Curve, resolver: &'a dyn VerificationMethodResolver) -> Self {
        Self { curve, resolver }
    }

    fn pipeline(&self) -> SuitePipeline<'a> {
        SuitePipeline {
            name: "ecdsa-jcs-2019",
            curve: self.curve,
            transformation: Transformation::Jcs,
            resolver: self.resolver,
        }
    }
}

impl CryptoSuite for EcdsaJcsSuite<'_> {
    fn name(&self) -> &'static str {
        "ecdsa-jcs-2019"
    }

    fn curve(&self) -> Curve {
        self.curve
    }

    fn create_proof(&self, document: &Document, options: &ProofOptions) -> Result<Document> {
        self.pipeline().create_proof(document, options)
    }

    fn verify_proof(&self, document: &Document) -> Result<VerificationResult> {
        self.pipeline().verify_proof(document)
    }
}
