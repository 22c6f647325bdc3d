//! Issuer side of the selective-disclosure protocol.

use std::collections::HashMap;

use super::proof_value::{serialize_base_proof_value, BaseProofValue};
use super::{SelectiveContext, CRYPTOSUITE_SD, GROUP_MANDATORY};
use crate::canonicalize::LabelMapFactory;
use crate::document::Document;
use crate::encoding::concatenate;
use crate::error::{Error, Result};
use crate::hash::{digest, generate_hmac_key, hash_mandatory_nquads};
use crate::key::{Curve, SecretKey};
use crate::proof::{Proof, ProofOptions};

/// Create a base proof over `document`.
///
/// The document is canonicalized under a fresh HMAC relabelling and split
/// into mandatory and non-mandatory N-Quads. Every non-mandatory N-Quad is
/// signed by a proof-scoped P-256 keypair that exists only within this call;
/// the issuer key then binds the proof configuration, the proof-scoped
/// public key, and the mandatory N-Quads together in the base signature.
pub(crate) fn create_base_proof(
    ctx: &SelectiveContext<'_>,
    document: &Document,
    options: &ProofOptions,
    mandatory_pointers: &[String],
) -> Result<Proof> {
    let pipeline = ctx.pipeline();
    let options = pipeline.effective_options(options);
    let unsecured_document = document.without_proof();

    // Transform: canonicalize under a fresh HMAC relabelling and group by
    // the mandatory pointers
    options.validate_suite(CRYPTOSUITE_SD, Error::ProofTransformation)?;
    let hmac_key = generate_hmac_key();
    let factory = LabelMapFactory::hmac_id(hmac_key);
    let group_definitions = HashMap::from([(
        GROUP_MANDATORY.to_string(),
        mandatory_pointers.to_vec(),
    )]);
    let canonical = ctx.selective.canonicalize_and_group(
        &unsecured_document.to_value(),
        &factory,
        &group_definitions,
        ctx.loader,
    )?;
    let mandatory_group = canonical.groups.get(GROUP_MANDATORY).ok_or_else(|| {
        Error::Canonicalization("canonicalize-and-group returned no mandatory group".to_string())
    })?;

    // Configure: canonical proof configuration and its hash
    let proof_config = pipeline.configure_proof(&unsecured_document, &options)?;
    let proof_hash = digest(ctx.curve, &proof_config);

    // Hash the mandatory N-Quads in ascending index order
    let mandatory_hash = hash_mandatory_nquads(
        mandatory_group.matching.values().map(String::as_str),
        ctx.curve,
    );

    // Serialize: per-statement signatures are always P-256/SHA-256, no
    // matter which curve the issuer signs on
    let proof_scoped_key = SecretKey::generate(Curve::P256);
    let signatures: Vec<Vec<u8>> = mandatory_group
        .non_matching
        .values()
        .map(|nquad| proof_scoped_key.sign(nquad.as_bytes()))
        .collect();
    let public_key = proof_scoped_key.public_key().multicodec_bytes();

    let to_sign = concatenate(&[&proof_hash, &public_key, &mandatory_hash]);
    let base_signature = pipeline.serialize_proof(&to_sign, &options)?;

    // Destroy the proof-scoped key pair; the scalar zeroizes on drop
    drop(proof_scoped_key);

    let proof_value = serialize_base_proof_value(&BaseProofValue {
        base_signature,
        public_key,
        hmac_key,
        signatures,
        mandatory_pointers: mandatory_pointers.to_vec(),
    })?;

    options.to_proof(proof_value)
}
