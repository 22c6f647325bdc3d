//! Curve-parameterized digests and the HMAC used for blank-node relabelling.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha384};

use crate::key::Curve;

type HmacSha256 = Hmac<Sha256>;

/// Length of the HMAC key used for blank-node label maps.
pub const HMAC_KEY_LENGTH: usize = 32;

/// Hash data with the digest belonging to the given curve.
///
/// P-256 pairs with SHA-256 (32 bytes), P-384 with SHA-384 (48 bytes).
pub fn digest(curve: Curve, data: &[u8]) -> Vec<u8> {
    match curve {
        Curve::P256 => Sha256::digest(data).to_vec(),
        Curve::P384 => Sha384::digest(data).to_vec(),
    }
}

/// Generate a fresh random HMAC key for blank-node relabelling.
pub fn generate_hmac_key() -> [u8; HMAC_KEY_LENGTH] {
    let mut key = [0u8; HMAC_KEY_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut key);
    key
}

/// HMAC-SHA-256 over `data`.
///
/// Blank-node label maps always use SHA-256: the 32-byte key and the 32-byte
/// relabelled entries carried in proof values pin the output size for both
/// curves.
pub fn hmac_sha256(key: &[u8; HMAC_KEY_LENGTH], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Concatenate mandatory N-Quads in ascending index order and hash once.
pub fn hash_mandatory_nquads<'a, I>(nquads: I, curve: Curve) -> Vec<u8>
where
    I: IntoIterator<Item = &'a str>,
{
    let joined: String = nquads.into_iter().collect();
    digest(curve, joined.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::bytes_to_hex;

    #[test]
    fn test_digest_lengths() {
        assert_eq!(digest(Curve::P256, b"data").len(), 32);
        assert_eq!(digest(Curve::P384, b"data").len(), 48);
    }

    #[test]
    fn test_sha256_empty_input() {
        assert_eq!(
            bytes_to_hex(&digest(Curve::P256, b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hmac_is_deterministic() {
        let key = [7u8; HMAC_KEY_LENGTH];
        assert_eq!(hmac_sha256(&key, b"c14n0"), hmac_sha256(&key, b"c14n0"));
        assert_ne!(hmac_sha256(&key, b"c14n0"), hmac_sha256(&key, b"c14n1"));
    }

    #[test]
    fn test_hash_mandatory_nquads_concatenates_in_order() {
        let quads = ["_:b0 <a> \"1\" .\n".to_string(), "_:b0 <b> \"2\" .\n".to_string()];
        let joined = format!("{}{}", quads[0], quads[1]);
        let expected = digest(Curve::P256, joined.as_bytes());
        let actual = hash_mandatory_nquads(quads.iter().map(String::as_str), Curve::P256);
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_hash_mandatory_nquads_empty_is_empty_digest() {
        let actual = hash_mandatory_nquads(std::iter::empty::<&str>(), Curve::P384);
        assert_eq!(actual, digest(Curve::P384, b""));
    }
}
