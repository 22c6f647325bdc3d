//! Holder side of the selective-disclosure protocol.

use std::collections::HashMap;

use super::proof_value::{
    parse_base_proof_value, serialize_derived_proof_value, DerivedProofValue,
};
use super::{SelectiveContext, GROUP_COMBINED, GROUP_MANDATORY, GROUP_SELECTIVE};
use crate::canonicalize::{LabelMap, LabelMapFactory, NQuadGroup};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::proof::Proof;

/// Derive a proof revealing `selective_pointers` (plus everything mandatory)
/// from a document secured with a base proof.
///
/// Returns the reveal document with the derived proof attached.
pub(crate) fn derive_proof(
    ctx: &SelectiveContext<'_>,
    document: &Document,
    selective_pointers: &[String],
) -> Result<Document> {
    let proof = document.proof()?.ok_or_else(|| {
        Error::ProofVerification("document does not contain a proof".to_string())
    })?;
    let base = parse_base_proof_value(proof.require_proof_value()?)?;

    // Reconstruct the HMAC relabelling the issuer used
    let factory = LabelMapFactory::hmac_id(base.hmac_key);

    let combined_pointers: Vec<String> = base
        .mandatory_pointers
        .iter()
        .chain(selective_pointers)
        .cloned()
        .collect();
    let group_definitions = HashMap::from([
        (GROUP_MANDATORY.to_string(), base.mandatory_pointers.clone()),
        (GROUP_SELECTIVE.to_string(), selective_pointers.to_vec()),
        (GROUP_COMBINED.to_string(), combined_pointers.clone()),
    ]);

    let unsecured_document = document.without_proof();
    let canonical = ctx.selective.canonicalize_and_group(
        &unsecured_document.to_value(),
        &factory,
        &group_definitions,
        ctx.loader,
    )?;
    let mandatory = group(&canonical.groups, GROUP_MANDATORY)?;
    let selective = group(&canonical.groups, GROUP_SELECTIVE)?;
    let combined = group(&canonical.groups, GROUP_COMBINED)?;

    // Relative indexes of mandatory N-Quads among the disclosed ones
    let mut mandatory_indexes = Vec::new();
    for (relative_index, absolute_index) in combined.matching.keys().enumerate() {
        if mandatory.matching.contains_key(absolute_index) {
            mandatory_indexes.push(relative_index);
        }
    }

    // Walk the base signatures (one per non-mandatory N-Quad, in ascending
    // absolute order) and keep those whose N-Quad is selectively disclosed
    let mut signatures = Vec::new();
    let mut absolute_index = 0usize;
    for signature in &base.signatures {
        while mandatory.matching.contains_key(&absolute_index) {
            absolute_index += 1;
        }
        if selective.matching.contains_key(&absolute_index) {
            signatures.push(signature.clone());
        }
        absolute_index += 1;
    }

    // Build the reveal document from the combined pointers
    let reveal_value = ctx
        .selective
        .select(&combined_pointers, &unsecured_document.to_value())?;

    // Canonicalize the disclosed N-Quads on their own to learn the labels
    // the verifier will see
    let joined: String = combined.deskolemized_nquads.concat();
    let (_, canonical_id_map) = ctx.canonicalizer.canonicalize_nquads(&joined)?;
    let mut label_map = LabelMap::new();
    for (input_label, verifier_label) in &canonical_id_map {
        let hmac_label = canonical.label_map.get(input_label).ok_or_else(|| {
            Error::Canonicalization(format!(
                "no HMAC label recorded for canonical label `{input_label}`"
            ))
        })?;
        label_map.insert(verifier_label.clone(), hmac_label.clone());
    }

    let proof_value = serialize_derived_proof_value(&DerivedProofValue {
        base_signature: base.base_signature,
        public_key: base.public_key,
        signatures,
        label_map,
        mandatory_indexes,
    })?;

    let derived_proof = Proof {
        proof_value: Some(proof_value),
        ..proof
    };
    Document::from_json_value(reveal_value)?.with_proof(&derived_proof)
}

fn group<'a>(
    groups: &'a HashMap<String, NQuadGroup>,
    name: &str,
) -> Result<&'a NQuadGroup> {
    groups.get(name).ok_or_else(|| {
        Error::Canonicalization(format!("canonicalize-and-group returned no {name} group"))
    })
}
