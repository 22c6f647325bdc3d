//! Byte-level codecs shared by the key layer and the proof suites.
//!
//! Multibase encodings follow the alphabet choices used across the Data
//! Integrity ecosystem: base58btc strings carry a `z` prefix, unpadded
//! base64url strings carry a `u` prefix. CBOR is RFC 8949 via `ciborium`.

use ciborium::Value as CborValue;
use multibase::Base;

use crate::error::{Error, Result};

/// Decode a hex string (no `0x` prefix) into bytes.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>> {
    hex::decode(hex).map_err(|e| Error::Decoding(format!("invalid hex: {e}")))
}

/// Encode bytes as a lowercase hex string (no `0x` prefix).
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Concatenate byte slices into a single buffer.
pub fn concatenate(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Encode binary data as a multibase base58btc string (`z` prefix).
pub fn base58btc_encode(data: &[u8]) -> String {
    multibase::encode(Base::Base58Btc, data)
}

/// Decode a multibase base58btc string.
///
/// The string must carry the `z` multibase prefix.
pub fn base58btc_decode(encoded: &str) -> Result<Vec<u8>> {
    let (base, bytes) = multibase::decode(encoded)
        .map_err(|e| Error::Decoding(format!("invalid multibase string: {e}")))?;
    if base != Base::Base58Btc {
        return Err(Error::Decoding(
            "expected base58btc ('z') multibase prefix".to_string(),
        ));
    }
    Ok(bytes)
}

/// Encode binary data as a multibase unpadded base64url string (`u` prefix).
pub fn base64url_nopad_encode(data: &[u8]) -> String {
    multibase::encode(Base::Base64Url, data)
}

/// Decode a multibase unpadded base64url string.
///
/// The string must carry the `u` multibase prefix.
pub fn base64url_nopad_decode(encoded: &str) -> Result<Vec<u8>> {
    let (base, bytes) = multibase::decode(encoded)
        .map_err(|e| Error::Decoding(format!("invalid multibase string: {e}")))?;
    if base != Base::Base64Url {
        return Err(Error::Decoding(
            "expected base64url ('u') multibase prefix".to_string(),
        ));
    }
    Ok(bytes)
}

/// Serialize a CBOR value to bytes.
///
/// Proof values never tag individual array elements; callers build plain
/// arrays, byte strings, maps and integers.
pub fn cbor_encode(value: &CborValue) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| Error::Encoding(format!("CBOR serialization failed: {e}")))?;
    Ok(buf)
}

/// Deserialize a CBOR value from bytes.
pub fn cbor_decode(bytes: &[u8]) -> Result<CborValue> {
    ciborium::from_reader(bytes)
        .map_err(|e| Error::Decoding(format!("CBOR deserialization failed: {e}")))
}
