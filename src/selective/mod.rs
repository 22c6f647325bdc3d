//! Selective-disclosure protocol core.
//!
//! The issuer signs a document at per-statement granularity
//! ([`base::create_base_proof`]), a holder reveals a subset of statements
//! without invalidating the proof ([`derive::derive_proof`]), and a verifier
//! checks the revealed subset ([`verify::verify_derived_proof`]).

/// Issuer side: base proof creation
pub(crate) mod base;

/// Holder side: derived proof creation
pub(crate) mod derive;

/// Base and derived proof-value codecs
pub mod proof_value;

/// Verifier side: derived proof verification
pub(crate) mod verify;

use crate::canonicalize::{DocumentLoader, RdfCanonicalizer, SelectiveCanonicalizer};
use crate::key::Curve;
use crate::suites::pipeline::{SuitePipeline, Transformation};
use crate::verification::VerificationMethodResolver;

pub(crate) const CRYPTOSUITE_SD: &str = "ecdsa-sd-2023";

/// Group names used by canonicalize-and-group runs.
pub(crate) const GROUP_MANDATORY: &str = "mandatory";
pub(crate) const GROUP_SELECTIVE: &str = "selective";
pub(crate) const GROUP_COMBINED: &str = "combined";

/// Collaborators threaded through the selective-disclosure operations.
pub(crate) struct SelectiveContext<'a> {
    pub curve: Curve,
    pub canonicalizer: &'a dyn RdfCanonicalizer,
    pub selective: &'a dyn SelectiveCanonicalizer,
    pub loader: &'a dyn DocumentLoader,
    pub resolver: &'a dyn VerificationMethodResolver,
}

impl<'a> SelectiveContext<'a> {
    /// The RDFC pipeline used for proof configuration and the base
    /// signature.
    pub fn pipeline(&self) -> SuitePipeline<'a> {
        SuitePipeline {
            name: CRYPTOSUITE_SD,
            curve: self.curve,
            transformation: Transformation::Rdfc {
                canonicalizer: self.canonicalizer,
                loader: self.loader,
            },
            resolver: self.resolver,
        }
    }
}
