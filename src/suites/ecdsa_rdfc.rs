use crate::canonicalize::{DocumentLoader, RdfCanonicalizer};
use crate::cryptosuite::CryptoSuite;
use crate::document::Document;
use crate::error::Result;
use crate::key::Curve;
use crate::proof::{ProofOptions, VerificationResult};
use crate::suites::pipeline::{SuitePipeline, Transformation};
use crate::verification::VerificationMethodResolver;

/// The `ecdsa-rdfc-2019` cryptographic suite.
///
/// Canonicalizes documents and proof configurations with RDF Dataset
/// Canonicalization (URDNA2015) through the external collaborator and signs
/// the concatenated digests with ECDSA on the configured curve.
pub struct EcdsaRdfcSuite<'a> {
    curve: Curve,
    canonicalizer: &'a dyn RdfCanonicalizer,
    loader: &'a dyn DocumentLoader,
    resolver: &'a dyn VerificationMethodResolver,
}

impl<'a> EcdsaRdfcSuite<'a> {
    /// Create a new ECDSA RDFC suite
    pub fn new(
        curve: Curve,
        canonicalizer: &'a dyn RdfCanonicalizer,
        loader: &'a dyn DocumentLoader,
        resolver: &'a dyn VerificationMethodResolver,
    ) -> Self {
        Self {
            curve,
            canonicalizer,
            loader,
            resolver,
        }
    }

    fn pipeline(&self) -> SuitePipeline<'a> {
        SuitePipeline {
            name: "ecdsa-rdfc-2019",
            curve: self.curve,
            transformation: Transformation::Rdfc {
                canonicalizer: self.canonicalizer,
                loader: self.loader,
            },
            resolver: self.resolver,
        }
    }
}

impl CryptoSuite for EcdsaRdfcSuite<'_> {
    fn name(&self) -> &'static str {
        "ecdsa-rdfc-2019"
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
