//! The four-stage proof pipeline shared by the non-selective suites:
//! transform, configure, hash, serialize/verify.
//!
//! The selective-disclosure suite borrows the configure and serialize stages
//! for its proof configuration hash and base signature.

use serde_json::Value;

use crate::canonicalize::{DocumentLoader, RdfCanonicalizer};
use crate::document::Document;
use crate::encoding::{base58btc_decode, base58btc_encode, concatenate};
use crate::error::{Error, Result};
use crate::hash::digest;
use crate::key::Curve;
use crate::keypair::{ECKeypair, ImportOptions};
use crate::proof::{Proof, ProofOptions, VerificationResult};
use crate::verification::VerificationMethodResolver;

/// How a document and a proof configuration become canonical bytes.
pub(crate) enum Transformation<'a> {
    /// RDF Dataset Canonicalization through the external collaborator
    Rdfc {
        canonicalizer: &'a dyn RdfCanonicalizer,
        loader: &'a dyn DocumentLoader,
    },
    /// JSON Canonicalization Scheme
    Jcs,
}

impl Transformation<'_> {
    fn canonicalize(&self, value: &Value) -> Result<Vec<u8>> {
        match self {
            Self::Rdfc {
                canonicalizer,
                loader,
            } => Ok(canonicalizer.canonicalize(value, *loader)?.into_bytes()),
            Self::Jcs => serde_jcs::to_vec(value)
                .map_err(|e| Error::Canonicalization(format!("JCS canonicalization failed: {e}"))),
        }
    }
}

/// The shared proof pipeline, parameterized by suite name, curve, and
/// transformation.
pub(crate) struct SuitePipeline<'a> {
    pub name: &'static str,
    pub curve: Curve,
    pub transformation: Transformation<'a>,
    pub resolver: &'a dyn VerificationMethodResolver,
}

impl SuitePipeline<'_> {
    /// Fill in `type` and `cryptosuite` defaults on a set of proof options.
    pub fn effective_options(&self, options: &ProofOptions) -> ProofOptions {
        options.with_defaults(self.name)
    }

    /// Create a proof over `document`, returning the secured document.
    pub fn create_proof(&self, document: &Document, options: &ProofOptions) -> Result<Document> {
        let options = self.effective_options(options);

        // Create proof config
        let proof_config = self.configure_proof(document, &options)?;

        // Transform document
        let transformed_data = self.transform(document, &options)?;

        // Hash the data
        let hash_data = self.hash(&transformed_data, &proof_config)?;

        // Generate and encode the proof value
        let proof_bytes = self.serialize_proof(&hash_data, &options)?;
        let proof_value = base58btc_encode(&proof_bytes);

        document.with_proof(&options.to_proof(proof_value)?)
    }

    /// Verify the proof on `document`.
    pub fn verify_proof(&self, document: &Document) -> Result<VerificationResult> {
        let proof = document.proof()?.ok_or_else(|| {
            Error::ProofVerification("document does not contain a proof".to_string())
        })?;

        // Remove proof from document and rebuild the options it was
        // configured from
        let unsecured_document = document.without_proof();
        let options = proof.to_options()?;

        // Decode proof value
        let proof_bytes = base58btc_decode(proof.require_proof_value()?)
            .map_err(|e| Error::ProofVerification(format!("malformed proof value: {e}")))?;

        // Transform document
        let transformed_data = self.transform(&unsecured_document, &options)?;

        // Configure proof
        let proof_config = self.configure_proof(&unsecured_document, &options)?;

        // Hash data
        let hash_data = self.hash(&transformed_data, &proof_config)?;

        // Verify proof
        let verified = self.proof_verify(&hash_data, &proof_bytes, &proof)?;

        Ok(VerificationResult {
            verified,
            verified_document: verified.then_some(unsecured_document),
        })
    }

    /// Canonicalize the document for hashing.
    pub fn transform(&self, document: &Document, options: &ProofOptions) -> Result<Vec<u8>> {
        options.validate_suite(self.name, Error::ProofTransformation)?;
        self.transformation.canonicalize(&document.to_value())
    }

    /// Validate the proof options and canonicalize them into a proof
    /// configuration.
    ///
    /// The configuration inherits the document's `@context` before
    /// canonicalization.
    pub fn configure_proof(&self, document: &Document, options: &ProofOptions) -> Result<Vec<u8>> {
        options.validate_suite(self.name, Error::ProofGeneration)?;
        options.validate_created()?;

        let config_value = options.to_config_value(document.context().cloned())?;
        self.transformation.canonicalize(&config_value)
    }

    /// Digest the proof configuration and the transformed document, in that
    /// order.
    pub fn hash(&self, transformed_data: &[u8], proof_config: &[u8]) -> Result<Vec<u8>> {
        Ok(concatenate(&[
            &digest(self.curve, proof_config),
            &digest(self.curve, transformed_data),
        ]))
    }

    /// Sign `hash_data` under the options' verification method.
    pub fn serialize_proof(&self, hash_data: &[u8], options: &ProofOptions) -> Result<Vec<u8>> {
        let verification_method = options.verification_method()?;
        let keypair = self.resolver.resolve_signing_key(verification_method)?;

        let secret_key = keypair.secret_key.as_ref().ok_or_else(|| {
            Error::InvalidVerificationMethod(format!(
                "no secret key available for {verification_method}"
            ))
        })?;
        if secret_key.curve() != self.curve {
            return Err(Error::ProofGeneration(format!(
                "signing key curve {} does not match suite curve {}",
                secret_key.curve(),
                self.curve
            )));
        }

        Ok(secret_key.sign(hash_data))
    }

    /// Verify `proof_bytes` over `hash_data` under the proof's verification
    /// method.
    pub fn proof_verify(
        &self,
        hash_data: &[u8],
        proof_bytes: &[u8],
        proof: &Proof,
    ) -> Result<bool> {
        if proof_bytes.len() != self.curve.signature_length() {
            return Err(Error::ProofVerification(format!(
                "signature must be {} bytes, got {}",
                self.curve.signature_length(),
                proof_bytes.len()
            )));
        }

        let method = self.resolver.resolve(&proof.verification_method)?;
        let keypair = ECKeypair::import(
            &method,
            &ImportOptions {
                curve: Some(self.curve),
                ..Default::default()
            },
        )?;
        let public_key = keypair.public_key.as_ref().ok_or_else(|| {
            Error::InvalidVerificationMethod(format!(
                "no public key available for {}",
                proof.verification_method
            ))
        })?;

        Ok(public_key.verify(hash_data, proof_bytes))
    }
}
