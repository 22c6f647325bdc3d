//! Serialization of base and derived selective-disclosure proof values.
//!
//! Both forms are `u`-multibase strings over a 3-byte header followed by a
//! plain CBOR array. No element of either array is tagged.

use ciborium::Value as CborValue;
use std::collections::BTreeMap;

use crate::canonicalize::LabelMap;
use crate::encoding::{
    base64url_nopad_decode, base64url_nopad_encode, cbor_decode, cbor_encode, concatenate,
};
use crate::error::{Error, Result};
use crate::hash::HMAC_KEY_LENGTH;

/// Header tag for a base proof value (`d9 5d 00`).
const BASE_PROOF_HEADER: [u8; 3] = [0xd9, 0x5d, 0x00];

/// Header tag for a derived proof value (`d9 5d 01`).
const DERIVED_PROOF_HEADER: [u8; 3] = [0xd9, 0x5d, 0x01];

/// Blank-node label prefix used by canonicalization.
const CANONICAL_LABEL_PREFIX: &str = "c14n";

/// Length of a per-statement signature (always P-256/SHA-256).
const STATEMENT_SIGNATURE_LENGTH: usize = 64;

/// Length of the multicodec-prefixed compressed proof-scoped public key.
const PROOF_SCOPED_KEY_LENGTH: usize = 35;

/// The five-tuple an issuer packs into a base proof value.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseProofValue {
    /// Issuer signature over `proofHash ‖ publicKey ‖ mandatoryHash`
    pub base_signature: Vec<u8>,
    /// Multicodec-prefixed compressed proof-scoped public key
    pub public_key: Vec<u8>,
    /// HMAC key for blank-node relabelling
    pub hmac_key: [u8; HMAC_KEY_LENGTH],
    /// Per-statement signatures over the non-mandatory N-Quads
    pub signatures: Vec<Vec<u8>>,
    /// JSON pointers that must always be disclosed
    pub mandatory_pointers: Vec<String>,
}

/// The five-tuple a holder packs into a derived proof value.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedProofValue {
    /// Issuer signature carried over from the base proof
    pub base_signature: Vec<u8>,
    /// Multicodec-prefixed compressed proof-scoped public key
    pub public_key: Vec<u8>,
    /// Signatures for the disclosed non-mandatory N-Quads
    pub signatures: Vec<Vec<u8>>,
    /// Verifier label → HMAC label
    pub label_map: LabelMap,
    /// Relative indexes of mandatory N-Quads among the disclosed ones
    pub mandatory_indexes: Vec<usize>,
}

/// Serialize a base proof value as `u` + base64url(header ‖ CBOR).
pub fn serialize_base_proof_value(value: &BaseProofValue) -> Result<String> {
    validate_base_signature(&value.base_signature, Error::ProofGeneration)?;
    validate_proof_scoped_key(&value.public_key, Error::ProofGeneration)?;
    for signature in &value.signatures {
        validate_statement_signature(signature, Error::ProofGeneration)?;
    }

    let array = CborValue::Array(vec![
        CborValue::Bytes(value.base_signature.clone()),
        CborValue::Bytes(value.public_key.clone()),
        CborValue::Bytes(value.hmac_key.to_vec()),
        CborValue::Array(
            value
                .signatures
                .iter()
                .map(|s| CborValue::Bytes(s.clone()))
                .collect(),
        ),
        CborValue::Array(
            value
                .mandatory_pointers
                .iter()
                .map(|p| CborValue::Text(p.clone()))
                .collect(),
        ),
    ]);

    let payload = concatenate(&[&BASE_PROOF_HEADER, &cbor_encode(&array)?]);
    Ok(base64url_nopad_encode(&payload))
}

/// Parse and validate a base proof value.
pub fn parse_base_proof_value(proof_value: &str) -> Result<BaseProofValue> {
    let items = parse_proof_value_array(proof_value, &BASE_PROOF_HEADER)?;
    let [base_signature, public_key, hmac_key, signatures, mandatory_pointers] = items;

    let base_signature = require_bytes(base_signature, "baseSignature")?;
    validate_base_signature(&base_signature, Error::ProofVerification)?;

    let public_key = require_bytes(public_key, "publicKey")?;
    validate_proof_scoped_key(&public_key, Error::ProofVerification)?;

    let hmac_key: [u8; HMAC_KEY_LENGTH] = require_bytes(hmac_key, "hmacKey")?
        .try_into()
        .map_err(|_| {
            Error::ProofVerification(format!("hmacKey must be {HMAC_KEY_LENGTH} bytes"))
        })?;

    let signatures = require_array(signatures, "signatures")?
        .into_iter()
        .map(|item| {
            let signature = require_bytes(item, "signature")?;
            validate_statement_signature(&signature, Error::ProofVerification)?;
            Ok(signature)
        })
        .collect::<Result<Vec<_>>>()?;

    let mandatory_pointers = require_array(mandatory_pointers, "mandatoryPointers")?
        .into_iter()
        .map(|item| match item {
            CborValue::Text(pointer) => Ok(pointer),
            _ => Err(Error::ProofVerification(
                "mandatory pointers must be strings".to_string(),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(BaseProofValue {
        base_signature,
        public_key,
        hmac_key,
        signatures,
        mandatory_pointers,
    })
}

/// Serialize a derived proof value as `u` + base64url(header ‖ CBOR).
pub fn serialize_derived_proof_value(value: &DerivedProofValue) -> Result<String> {
    validate_base_signature(&value.base_signature, Error::ProofGeneration)?;
    validate_proof_scoped_key(&value.public_key, Error::ProofGeneration)?;
    for signature in &value.signatures {
        validate_statement_signature(signature, Error::ProofGeneration)?;
    }

    let compressed = compress_label_map(&value.label_map)?;
    let array = CborValue::Array(vec![
        CborValue::Bytes(value.base_signature.clone()),
        CborValue::Bytes(value.public_key.clone()),
        CborValue::Array(
            value
                .signatures
                .iter()
                .map(|s| CborValue::Bytes(s.clone()))
                .collect(),
        ),
        CborValue::Map(
            compressed
                .into_iter()
                .map(|(index, bytes)| {
                    (
                        CborValue::Integer((index as u64).into()),
                        CborValue::Bytes(bytes),
                    )
                })
                .collect(),
        ),
        CborValue::Array(
            value
                .mandatory_indexes
                .iter()
                .map(|&index| CborValue::Integer((index as u64).into()))
                .collect(),
        ),
    ]);

    let payload = concatenate(&[&DERIVED_PROOF_HEADER, &cbor_encode(&array)?]);
    Ok(base64url_nopad_encode(&payload))
}

/// Parse and validate a derived proof value.
pub fn parse_derived_proof_value(proof_value: &str) -> Result<DerivedProofValue> {
    let items = parse_proof_value_array(proof_value, &DERIVED_PROOF_HEADER)?;
    let [base_signature, public_key, signatures, label_map, mandatory_indexes] = items;

    let base_signature = require_bytes(base_signature, "baseSignature")?;
    validate_base_signature(&base_signature, Error::ProofVerification)?;

    let public_key = require_bytes(public_key, "publicKey")?;
    validate_proof_scoped_key(&public_key, Error::ProofVerification)?;

    let signatures = require_array(signatures, "signatures")?
        .into_iter()
        .map(|item| {
            let signature = require_bytes(item, "signature")?;
            validate_statement_signature(&signature, Error::ProofVerification)?;
            Ok(signature)
        })
        .collect::<Result<Vec<_>>>()?;

    let CborValue::Map(entries) = label_map else {
        return Err(Error::ProofVerification(
            "compressed label map must be a map".to_string(),
        ));
    };
    let mut compressed = BTreeMap::new();
    for (key, value) in entries {
        let index = require_index(key, "label map key")?;
        let bytes = require_bytes(value, "label map value")?;
        if bytes.len() != HMAC_KEY_LENGTH {
            return Err(Error::ProofVerification(format!(
                "label map entries must be {HMAC_KEY_LENGTH} bytes"
            )));
        }
        compressed.insert(index as u64, bytes);
    }
    let label_map = decompress_label_map(&compressed);

    let mandatory_indexes = require_array(mandatory_indexes, "mandatoryIndexes")?
        .into_iter()
        .map(|item| require_index(item, "mandatory index"))
        .collect::<Result<Vec<_>>>()?;

    Ok(DerivedProofValue {
        base_signature,
        public_key,
        signatures,
        label_map,
        mandatory_indexes,
    })
}

/// Compress a verifier label map into integer keys and raw HMAC bytes.
///
/// Keys must be canonical `c14nN` labels; values must be `u`-multibase
/// encodings of 32-byte HMAC outputs.
pub fn compress_label_map(label_map: &LabelMap) -> Result<BTreeMap<u64, Vec<u8>>> {
    let mut compressed = BTreeMap::new();
    for (label, value) in label_map {
        let index = label
            .strip_prefix(CANONICAL_LABEL_PREFIX)
            .and_then(|rest| rest.parse::<u64>().ok())
            .ok_or_else(|| {
                Error::ProofGeneration(format!("expected canonical blank-node label, got {label}"))
            })?;
        let bytes = base64url_nopad_decode(value)
            .map_err(|_| Error::ProofGeneration(format!("invalid HMAC label: {value}")))?;
        if bytes.len() != HMAC_KEY_LENGTH {
            return Err(Error::ProofGeneration(format!(
                "HMAC labels must decode to {HMAC_KEY_LENGTH} bytes"
            )));
        }
        compressed.insert(index, bytes);
    }
    Ok(compressed)
}

/// Inverse of [`compress_label_map`].
pub fn decompress_label_map(compressed: &BTreeMap<u64, Vec<u8>>) -> LabelMap {
    compressed
        .iter()
        .map(|(index, bytes)| {
            (
                format!("{CANONICAL_LABEL_PREFIX}{index}"),
                base64url_nopad_encode(bytes),
            )
        })
        .collect()
}

fn parse_proof_value_array(proof_value: &str, header: &[u8; 3]) -> Result<[CborValue; 5]> {
    if !proof_value.starts_with('u') {
        return Err(Error::ProofVerification(
            "proof value must use the base64url ('u') multibase encoding".to_string(),
        ));
    }
    let bytes = base64url_nopad_decode(proof_value)
        .map_err(|e| Error::ProofVerification(format!("malformed proof value: {e}")))?;

    if bytes.len() < 3 || bytes[..3] != *header {
        return Err(Error::ProofVerification(
            "unexpected proof value header".to_string(),
        ));
    }

    let value = cbor_decode(&bytes[3..])
        .map_err(|e| Error::ProofVerification(format!("malformed proof value payload: {e}")))?;
    let CborValue::Array(items) = value else {
        return Err(Error::ProofVerification(
            "proof value payload must be a CBOR array".to_string(),
        ));
    };
    items.try_into().map_err(|_| {
        Error::ProofVerification("proof value payload must have five elements".to_string())
    })
}

fn require_bytes(value: CborValue, name: &str) -> Result<Vec<u8>> {
    match value {
        CborValue::Bytes(bytes) => Ok(bytes),
        _ => Err(Error::ProofVerification(format!(
            "{name} must be a CBOR byte string"
        ))),
    }
}

fn require_array(value: CborValue, name: &str) -> Result<Vec<CborValue>> {
    match value {
        CborValue::Array(items) => Ok(items),
        _ => Err(Error::ProofVerification(format!(
            "{name} must be a CBOR array"
        ))),
    }
}

fn require_index(value: CborValue, name: &str) -> Result<usize> {
    match value {
        CborValue::Integer(integer) => usize::try_from(i128::from(integer)).map_err(|_| {
            Error::ProofVerification(format!("{name} must be a non-negative integer"))
        }),
        _ => Err(Error::ProofVerification(format!(
            "{name} must be an integer"
        ))),
    }
}

fn validate_base_signature(signature: &[u8], make_error: fn(String) -> Error) -> Result<()> {
    if signature.len() != 64 && signature.len() != 96 {
        return Err(make_error(format!(
            "base signature must be 64 or 96 bytes, got {}",
            signature.len()
        )));
    }
    Ok(())
}

fn validate_proof_scoped_key(public_key: &[u8], make_error: fn(String) -> Error) -> Result<()> {
    if public_key.len() != PROOF_SCOPED_KEY_LENGTH {
        return Err(make_error(format!(
            "proof-scoped public key must be {PROOF_SCOPED_KEY_LENGTH} bytes, got {}",
            public_key.len()
        )));
    }
    Ok(())
}

fn validate_statement_signature(signature: &[u8], make_error: fn(String) -> Error) -> Result<()> {
    if signature.len() != STATEMENT_SIGNATURE_LENGTH {
        return Err(make_error(format!(
            "statement signatures must be {STATEMENT_SIGNATURE_LENGTH} bytes, got {}",
            signature.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_base() -> BaseProofValue {
        BaseProofValue {
            base_signature: vec![1u8; 64],
            public_key: vec![2u8; 35],
            hmac_key: [3u8; HMAC_KEY_LENGTH],
            signatures: vec![vec![4u8; 64], vec![5u8; 64]],
            mandatory_pointers: vec!["/issuer".to_string()],
        }
    }

    fn sample_label_map() -> LabelMap {
        let mut map = LabelMap::new();
        map.insert("c14n0".to_string(), base64url_nopad_encode(&[7u8; 32]));
        map.insert("c14n2".to_string(), base64url_nopad_encode(&[9u8; 32]));
        map
    }

    fn sample_derived() -> DerivedProofValue {
        DerivedProofValue {
            base_signature: vec![1u8; 96],
            public_key: vec![2u8; 35],
            signatures: vec![vec![4u8; 64]],
            label_map: sample_label_map(),
            mandatory_indexes: vec![0, 2],
        }
    }

    #[test]
    fn test_base_proof_value_round_trip() {
        let value = sample_base();
        let encoded = serialize_base_proof_value(&value).unwrap();
        assert!(encoded.starts_with('u'));
        assert_eq!(parse_base_proof_value(&encoded).unwrap(), value);
    }

    #[test]
    fn test_derived_proof_value_round_trip() {
        let value = sample_derived();
        let encoded = serialize_derived_proof_value(&value).unwrap();
        assert!(encoded.starts_with('u'));
        assert_eq!(parse_derived_proof_value(&encoded).unwrap(), value);
    }

    #[test]
    fn test_label_map_compression_round_trip() {
        let map = sample_label_map();
        let compressed = compress_label_map(&map).unwrap();
        assert_eq!(compressed.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(decompress_label_map(&compressed), map);
    }

    #[test]
    fn test_compress_rejects_bad_labels() {
        let mut map = LabelMap::new();
        map.insert("b0".to_string(), base64url_nopad_encode(&[0u8; 32]));
        assert!(compress_label_map(&map).is_err());

        let mut map = LabelMap::new();
        map.insert("c14n0".to_string(), "zNotBase64Url".to_string());
        assert!(compress_label_map(&map).is_err());

        let mut map = LabelMap::new();
        map.insert("c14n0".to_string(), base64url_nopad_encode(&[0u8; 16]));
        assert!(compress_label_map(&map).is_err());
    }

    #[test]
    fn test_rejects_missing_multibase_prefix() {
        assert!(matches!(
            parse_base_proof_value("zSomethingElse"),
            Err(Error::ProofVerification(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_header() {
        // a base proof value fed to the derived parser and vice versa
        let base = serialize_base_proof_value(&sample_base()).unwrap();
        assert!(matches!(
            parse_derived_proof_value(&base),
            Err(Error::ProofVerification(_))
        ));

        let derived = serialize_derived_proof_value(&sample_derived()).unwrap();
        assert!(matches!(
            parse_base_proof_value(&derived),
            Err(Error::ProofVerification(_))
        ));
    }

    #[test]
    fn test_rejects_bad_component_lengths() {
        let mut value = sample_base();
        value.base_signature = vec![0u8; 65];
        assert!(serialize_base_proof_value(&value).is_err());

        let mut value = sample_base();
        value.public_key = vec![0u8; 34];
        assert!(serialize_base_proof_value(&value).is_err());

        let mut value = sample_base();
        value.signatures.push(vec![0u8; 96]);
        assert!(serialize_base_proof_value(&value).is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_payload() {
        let encoded = serialize_base_proof_value(&sample_base()).unwrap();
        let bytes = base64url_nopad_decode(&encoded).unwrap();
        let truncated = base64url_nopad_encode(&bytes[..bytes.len() - 4]);
        assert!(matches!(
            parse_base_proof_value(&truncated),
            Err(Error::ProofVerification(_))
        ));
    }

    #[test]
    fn test_parse_rejects_mandatory_pointer_non_string() {
        // hand-build a payload with an integer in the pointer array
        let array = CborValue::Array(vec![
            CborValue::Bytes(vec![1u8; 64]),
            CborValue::Bytes(vec![2u8; 35]),
            CborValue::Bytes(vec![3u8; 32]),
            CborValue::Array(vec![]),
            CborValue::Array(vec![CborValue::Integer(1.into())]),
        ]);
        let payload = concatenate(&[&BASE_PROOF_HEADER, &cbor_encode(&array).unwrap()]);
        let encoded = base64url_nopad_encode(&payload);
        assert!(matches!(
            parse_base_proof_value(&encoded),
            Err(Error::ProofVerification(_))
        ));
    }

    #[test]
    fn test_parse_rejects_negative_mandatory_index() {
        let array = CborValue::Array(vec![
            CborValue::Bytes(vec![1u8; 64]),
            CborValue::Bytes(vec![2u8; 35]),
            CborValue::Array(vec![]),
            CborValue::Map(vec![]),
            CborValue::Array(vec![CborValue::Integer((-1).into())]),
        ]);
        let payload = concatenate(&[&DERIVED_PROOF_HEADER, &cbor_encode(&array).unwrap()]);
        let encoded = base64url_nopad_encode(&payload);
        assert!(matches!(
            parse_derived_proof_value(&encoded),
            Err(Error::ProofVerification(_))
        ));
    }
}
