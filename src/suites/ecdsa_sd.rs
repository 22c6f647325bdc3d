use crate::canonicalize::{DocumentLoader, RdfCanonicalizer, SelectiveCanonicalizer};
use crate::cryptosuite::CryptoSuite;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::key::Curve;
use crate::proof::{ProofOptions, VerificationResult};
use crate::selective::{base, derive, verify, SelectiveContext, CRYPTOSUITE_SD};
use crate::verification::VerificationMethodResolver;

/// The `ecdsa-sd-2023` selective-disclosure cryptographic suite.
///
/// [`CryptoSuite::create_proof`] issues a base proof over the whole document;
/// [`EcdsaSdSuite::derive_proof`] turns a secured document into a reveal
/// document disclosing a chosen subset; [`CryptoSuite::verify_proof`] checks
/// a reveal document.
pub struct EcdsaSdSuite<'a> {
    curve: Curve,
    mandatory_pointers: Vec<String>,
    canonicalizer: &'a dyn RdfCanonicalizer,
    selective: &'a dyn SelectiveCanonicalizer,
    loader: &'a dyn DocumentLoader,
    resolver: &'a dyn VerificationMethodResolver,
}

impl<'a> EcdsaSdSuite<'a> {
    /// Create a new ECDSA selective-disclosure suite
    pub fn new(
        curve: Curve,
        canonicalizer: &'a dyn RdfCanonicalizer,
        selective: &'a dyn SelectiveCanonicalizer,
        loader: &'a dyn DocumentLoader,
        resolver: &'a dyn VerificationMethodResolver,
    ) -> Self {
        Self {
            curve,
            mandatory_pointers: Vec::new(),
            canonicalizer,
            selective,
            loader,
            resolver,
        }
    }

    /// JSON pointers an issuer requires every derived proof to disclose.
    ///
    /// An empty list is legal and lets holders disclose any subset.
    pub fn with_mandatory_pointers(mut self, pointers: Vec<String>) -> Self {
        self.mandatory_pointers = pointers;
        self
    }

    /// Derive a proof from a secured document, revealing the mandatory
    /// pointers plus `selective_pointers`.
    pub fn derive_proof(
        &self,
        document: &Document,
        selective_pointers: &[String],
    ) -> Result<Document> {
        self.check_proof_header(document)?;
        derive::derive_proof(&self.context(), document, selective_pointers)
    }

    fn context(&self) -> SelectiveContext<'a> {
        SelectiveContext {
            curve: self.curve,
            canonicalizer: self.canonicalizer,
            selective: self.selective,
            loader: self.loader,
            resolver: self.resolver,
        }
    }

    /// Reject documents whose proof names a different type or cryptosuite.
    fn check_proof_header(&self, document: &Document) -> Result<()> {
        let proof = document.proof()?.ok_or_else(|| {
            Error::ProofVerification("document does not contain a proof".to_string())
        })?;
        if proof.type_ != crate::proof::ProofType::DataIntegrityProof {
            return Err(Error::ProofTransformation(format!(
                "unsupported proof type: {:?}",
                proof.type_
            )));
        }
        if proof.cryptosuite != CRYPTOSUITE_SD {
            return Err(Error::ProofTransformation(format!(
                "unsupported cryptosuite: {}",
                proof.cryptosuite
            )));
        }
        Ok(())
    }
}

impl CryptoSuite for EcdsaSdSuite<'_> {
    fn name(&self) -> &'static str {
        CRYPTOSUITE_SD
    }

    fn curve(&self) -> Curve {
        self.curve
    }

    fn create_proof(&self, document: &Document, options: &ProofOptions) -> Result<Document> {
        let proof = base::create_base_proof(
            &self.context(),
            document,
            options,
            &self.mandatory_pointers,
        )?;
        document.without_proof().with_proof(&proof)
    }

    fn verify_proof(&self, document: &Document) -> Result<VerificationResult> {
        self.check_proof_header(document)?;
        verify::verify_derived_proof(&self.context(), document)
    }
}
