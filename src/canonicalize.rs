//! Interfaces to the external canonicalization collaborators.
//!
//! RDF Dataset Canonicalization, JSON-LD loading, and JSON-Pointer selection
//! are consumed through the traits below, never implemented here. JCS is the
//! exception: it is consumed directly through the `serde_jcs` crate by the
//! JCS pipeline.
//!
//! The one piece of relabelling logic that lives in this crate is
//! [`LabelMapFactory`]: collaborators call back into it to turn a canonical
//! blank-node id map into the replacement labels a proof needs.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::encoding::base64url_nopad_encode;
use crate::error::{Error, Result};
use crate::hash::{hmac_sha256, HMAC_KEY_LENGTH};

/// A blank-node label map. Keys and values never carry the `_:` prefix.
pub type LabelMap = BTreeMap<String, String>;

/// A document fetched by the loader.
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    /// URL the document was resolved from
    pub document_url: String,
    /// The resolved JSON document
    pub document: Value,
}

/// Resolves JSON-LD contexts and other remote documents by URL.
pub trait DocumentLoader {
    /// Fetch the document behind `url`.
    ///
    /// Loader failures propagate to the caller unchanged.
    fn load(&self, url: &str) -> Result<RemoteDocument>;
}

/// RDF Dataset Canonicalization (URDNA2015 / RDFC-1.0).
pub trait RdfCanonicalizer {
    /// Canonicalize a JSON-LD document into joined canonical N-Quads.
    fn canonicalize(&self, document: &Value, loader: &dyn DocumentLoader) -> Result<String>;

    /// Canonicalize an N-Quads dataset, capturing the canonical id map.
    ///
    /// Returns the canonical N-Quads and a map from input blank-node label
    /// to canonical label, both sides stripped of the `_:` prefix.
    fn canonicalize_nquads(&self, nquads: &str) -> Result<(Vec<String>, LabelMap)>;
}

/// One group out of a canonicalize-and-group run.
#[derive(Debug, Clone, Default)]
pub struct NQuadGroup {
    /// N-Quads selected by the group's pointers, keyed by absolute index
    pub matching: BTreeMap<usize, String>,
    /// N-Quads not selected, keyed by absolute index
    pub non_matching: BTreeMap<usize, String>,
    /// The matching N-Quads under their pre-relabelling canonical labels,
    /// in ascending index order
    pub deskolemized_nquads: Vec<String>,
}

/// Output of [`SelectiveCanonicalizer::canonicalize_and_group`].
#[derive(Debug, Clone, Default)]
pub struct CanonicalizedAndGrouped {
    /// Named groups keyed by the caller's group names
    pub groups: HashMap<String, NQuadGroup>,
    /// Canonical label → replacement label produced by the factory
    pub label_map: LabelMap,
    /// All relabelled canonical N-Quads in absolute-index order
    pub nquads: Vec<String>,
}

/// Canonicalization with blank-node relabelling and JSON-Pointer grouping,
/// as used by the selective-disclosure suite.
pub trait SelectiveCanonicalizer {
    /// Canonicalize `document`, relabel blank nodes through `factory`, and
    /// partition the N-Quads into the named pointer groups.
    fn canonicalize_and_group(
        &self,
        document: &Value,
        factory: &LabelMapFactory,
        groups: &HashMap<String, Vec<String>>,
        loader: &dyn DocumentLoader,
    ) -> Result<CanonicalizedAndGrouped>;

    /// Canonicalize `document` and relabel blank nodes through `factory`,
    /// returning the relabelled canonical N-Quads.
    fn label_replacement_canonicalize(
        &self,
        document: &Value,
        factory: &LabelMapFactory,
        loader: &dyn DocumentLoader,
    ) -> Result<Vec<String>>;

    /// Select the sub-document named by the JSON pointers.
    fn select(&self, pointers: &[String], document: &Value) -> Result<Value>;
}

/// Produces replacement labels for canonical blank-node labels.
///
/// Collaborators apply the factory to the canonical id map of a
/// canonicalization run; the resulting label map drives relabelling.
#[derive(Debug, Clone)]
pub enum LabelMapFactory {
    /// Replace each canonical label with the `u`-multibase HMAC-SHA-256 of
    /// the label itself, preventing correlation across derived proofs
    HmacId { key: [u8; HMAC_KEY_LENGTH] },
    /// Replace each canonical label through a fixed map
    Fixed { label_map: LabelMap },
}

impl LabelMapFactory {
    /// An HMAC-keyed relabelling factory.
    pub fn hmac_id(key: [u8; HMAC_KEY_LENGTH]) -> Self {
        Self::HmacId { key }
    }

    /// A fixed-map relabelling factory.
    pub fn from_label_map(label_map: LabelMap) -> Self {
        Self::Fixed { label_map }
    }

    /// Apply the factory to a canonical id map (input label → canonical
    /// label), producing a map from canonical label to replacement label.
    pub fn apply(&self, canonical_id_map: &LabelMap) -> Result<LabelMap> {
        let mut replacements = LabelMap::new();
        for canonical_label in canonical_id_map.values() {
            let replacement = match self {
                Self::HmacId { key } => {
                    base64url_nopad_encode(&hmac_sha256(key, canonical_label.as_bytes()))
                }
                Self::Fixed { label_map } => label_map
                    .get(canonical_label)
                    .cloned()
                    .ok_or_else(|| {
                        Error::Canonicalization(format!(
                            "label map has no entry for canonical label `{canonical_label}`"
                        ))
                    })?,
            };
            replacements.insert(canonical_label.clone(), replacement);
        }
        Ok(replacements)
    }
}
