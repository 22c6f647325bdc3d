//! Verifier side of the selective-disclosure protocol.

use std::collections::HashSet;

use super::proof_value::parse_derived_proof_value;
use super::SelectiveContext;
use crate::canonicalize::LabelMapFactory;
use crate::document::Document;
use crate::encoding::concatenate;
use crate::error::{Error, Result};
use crate::hash::{digest, hash_mandatory_nquads};
use crate::key::{Curve, PublicKey};
use crate::keypair::{ECKeypair, ImportOptions};
use crate::proof::VerificationResult;

/// Verify a reveal document carrying a derived proof.
///
/// The result is the conjunction of the base-signature check and every
/// per-statement signature check; any mismatch in counts or shapes is an
/// error instead.
pub(crate) fn verify_derived_proof(
    ctx: &SelectiveContext<'_>,
    document: &Document,
) -> Result<VerificationResult> {
    let proof = document.proof()?.ok_or_else(|| {
        Error::ProofVerification("document does not contain a proof".to_string())
    })?;
    let derived = parse_derived_proof_value(proof.require_proof_value()?)?;

    // Re-canonicalize the reveal document under the disclosed label map
    let factory = LabelMapFactory::from_label_map(derived.label_map.clone());
    let unsecured_document = document.without_proof();
    let canonical_nquads = ctx.selective.label_replacement_canonicalize(
        &unsecured_document.to_value(),
        &factory,
        ctx.loader,
    )?;

    // Partition into mandatory and non-mandatory N-Quads
    let mandatory_indexes: HashSet<usize> = derived.mandatory_indexes.iter().copied().collect();
    let mut mandatory = Vec::new();
    let mut non_mandatory = Vec::new();
    for index in &mandatory_indexes {
        if *index >= canonical_nquads.len() {
            return Err(Error::ProofVerification(format!(
                "mandatory index {index} is out of range"
            )));
        }
    }
    for (index, nquad) in canonical_nquads.iter().enumerate() {
        if mandatory_indexes.contains(&index) {
            mandatory.push(nquad.as_str());
        } else {
            non_mandatory.push(nquad.as_str());
        }
    }

    if derived.signatures.len() != non_mandatory.len() {
        return Err(Error::ProofVerification(format!(
            "{} signatures do not cover {} non-mandatory N-Quads",
            derived.signatures.len(),
            non_mandatory.len()
        )));
    }

    // Recompute the data the issuer signed
    let mandatory_hash = hash_mandatory_nquads(mandatory.iter().copied(), ctx.curve);
    let pipeline = ctx.pipeline();
    let options = proof.to_options()?;
    let proof_config = pipeline.configure_proof(&unsecured_document, &options)?;
    let proof_hash = digest(ctx.curve, &proof_config);
    let to_verify = concatenate(&[&proof_hash, &derived.public_key, &mandatory_hash]);

    // Base signature under the issuer's verification method
    let method = ctx.resolver.resolve(&proof.verification_method)?;
    let keypair = ECKeypair::import(
        &method,
        &ImportOptions {
            curve: Some(ctx.curve),
            ..Default::default()
        },
    )?;
    let issuer_key = keypair.public_key.as_ref().ok_or_else(|| {
        Error::InvalidVerificationMethod(format!(
            "no public key available for {}",
            proof.verification_method
        ))
    })?;
    let mut verified = issuer_key.verify(&to_verify, &derived.base_signature);

    // Per-statement signatures under the reconstructed proof-scoped key
    let proof_scoped_key = PublicKey::from_multicodec_bytes(&derived.public_key)
        .map_err(|e| Error::ProofVerification(format!("invalid proof-scoped key: {e}")))?;
    if proof_scoped_key.curve() != Curve::P256 {
        return Err(Error::ProofVerification(
            "proof-scoped key must be P-256".to_string(),
        ));
    }
    for (signature, nquad) in derived.signatures.iter().zip(&non_mandatory) {
        verified &= proof_scoped_key.verify(nquad.as_bytes(), signature);
    }

    Ok(VerificationResult {
        verified,
        verified_document: verified.then_some(unsecured_document),
    })
}
