//! JSON Web Key transcoding for EC keys (RFC 7517) and the RFC 7638
//! thumbprint.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::encoding::concatenate;
use crate::error::{Error, Result};
use crate::key::{Curve, PublicKey, SecretKey};

/// An EC JSON Web Key.
///
/// Only the EC members used by the ECDSA suites are modeled; `x` and `y` are
/// always present, `d` only on secret keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonWebKey {
    /// Key type, always `EC`
    pub kty: String,
    /// JOSE curve name (`P-256` / `P-384`)
    pub crv: String,
    /// x coordinate, unpadded base64url
    pub x: String,
    /// y coordinate, unpadded base64url
    pub y: String,
    /// Private scalar, unpadded base64url
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl JsonWebKey {
    /// Build a public JWK from a public key handle.
    pub fn from_public_key(key: &PublicKey) -> Self {
        let curve = key.curve();
        let coordinates = key.uncompressed_coordinates();
        let (x, y) = coordinates.split_at(curve.secret_length());
        Self {
            kty: "EC".to_string(),
            crv: curve.name().to_string(),
            x: Base64UrlUnpadded::encode_string(x),
            y: Base64UrlUnpadded::encode_string(y),
            d: None,
        }
    }

    /// Build a secret JWK (public coordinates plus `d`) from a secret key
    /// handle.
    pub fn from_secret_key(secret: &SecretKey) -> Result<Self> {
        let mut jwk = Self::from_public_key(&secret.public_key());
        let material = Zeroizing::new(secret.to_material()?);
        jwk.d = Some(Base64UrlUnpadded::encode_string(&material));
        Ok(jwk)
    }

    /// The curve named by `crv`, after checking the key type.
    pub fn curve(&self) -> Result<Curve> {
        if self.kty != "EC" {
            return Err(Error::Decoding(format!(
                "unsupported JWK key type: {}",
                self.kty
            )));
        }
        Curve::from_name(&self.crv)
    }

    /// Import the public half as a key handle.
    pub fn to_public_key(&self) -> Result<PublicKey> {
        let curve = self.curve()?;
        let x = decode_coordinate(&self.x, curve)?;
        let y = decode_coordinate(&self.y, curve)?;
        let point = concatenate(&[&[0x04], &x, &y]);
        PublicKey::from_sec1_bytes(curve, &point)
    }

    /// Import the secret half as a key handle.
    ///
    /// A JWK without `d` cannot produce a secret key.
    pub fn to_secret_key(&self) -> Result<SecretKey> {
        let curve = self.curve()?;
        let d = self
            .d
            .as_ref()
            .ok_or_else(|| Error::Decoding("missing 'd' on secret JWK import".to_string()))?;
        let d = Base64UrlUnpadded::decode_vec(d)
            .map_err(|e| Error::Decoding(format!("invalid base64url in 'd': {e}")))?;
        SecretKey::from_material(curve, &d)
    }

    /// A copy of this JWK with the private scalar removed.
    pub fn public_jwk(&self) -> Self {
        Self { d: None, ..self.clone() }
    }

    /// RFC 7638 thumbprint: unpadded base64url of SHA-256 over the
    /// lexicographically-ordered required public members.
    pub fn thumbprint(&self) -> String {
        // Required EC members in lexicographical order, without whitespace
        // or string escaping.
        let json = format!(
            r#"{{"crv":"{}","kty":"{}","x":"{}","y":"{}"}}"#,
            self.crv, self.kty, self.x, self.y
        );
        let hash = Sha256::digest(json.as_bytes());
        Base64UrlUnpadded::encode_string(&hash)
    }
}

fn decode_coordinate(encoded: &str, curve: Curve) -> Result<Vec<u8>> {
    let bytes = Base64UrlUnpadded::decode_vec(encoded)
        .map_err(|e| Error::Decoding(format!("invalid base64url coordinate: {e}")))?;
    if bytes.len() != curve.secret_length() {
        return Err(Error::InvalidKeypairLength(curve.secret_length(), bytes.len()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Curve;

    #[test]
    fn test_public_jwk_round_trip() {
        for curve in [Curve::P256, Curve::P384] {
            let public = SecretKey::generate(curve).public_key();
            let jwk = JsonWebKey::from_public_key(&public);
            assert_eq!(jwk.kty, "EC");
            assert_eq!(jwk.crv, curve.name());
            assert!(jwk.d.is_none());
            assert_eq!(jwk.to_public_key().unwrap(), public);
        }
    }

    #[test]
    fn test_secret_jwk_round_trip() {
        for curve in [Curve::P256, Curve::P384] {
            let secret = SecretKey::generate(curve);
            let jwk = JsonWebKey::from_secret_key(&secret).unwrap();
            let restored = jwk.to_secret_key().unwrap();
            assert_eq!(restored.to_material().unwrap(), secret.to_material().unwrap());
            // one more export cycle is stable
            assert_eq!(JsonWebKey::from_secret_key(&restored).unwrap(), jwk);
        }
    }

    #[test]
    fn test_secret_import_requires_d() {
        let public = SecretKey::generate(Curve::P256).public_key();
        let jwk = JsonWebKey::from_public_key(&public);
        assert!(matches!(jwk.to_secret_key(), Err(Error::Decoding(_))));
    }

    #[test]
    fn test_rejects_wrong_kty_and_crv() {
        let secret = SecretKey::generate(Curve::P256);
        let mut jwk = JsonWebKey::from_secret_key(&secret).unwrap();
        jwk.kty = "OKP".to_string();
        assert!(jwk.to_public_key().is_err());

        let mut jwk = JsonWebKey::from_secret_key(&secret).unwrap();
        jwk.crv = "Ed25519".to_string();
        assert!(matches!(jwk.to_public_key(), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_thumbprint_covers_public_members_only() {
        let secret = SecretKey::generate(Curve::P256);
        let jwk = JsonWebKey::from_secret_key(&secret).unwrap();
        assert_eq!(jwk.thumbprint(), jwk.public_jwk().thumbprint());
        // unpadded base64url of a SHA-256 hash
        assert_eq!(jwk.thumbprint().len(), 43);
        assert!(!jwk.thumbprint().contains('='));
    }

    #[test]
    fn test_serialization_field_order_is_stable() {
        let public = SecretKey::generate(Curve::P256).public_key();
        let jwk = JsonWebKey::from_public_key(&public);
        let json = serde_json::to_string(&jwk).unwrap();
        assert!(json.starts_with(r#"{"kty":"EC","crv":"P-256","x":"#));
        assert!(!json.contains("\"d\""));
    }
}
