//! ECDSA key handles and the conversions between raw handles, octet key
//! material, and Multikey strings.
//!
//! Key material always moves through the canonical DER framings: SPKI for
//! public keys, PKCS#8 for secret keys. Exports are validated against fixed
//! prefix tables so that a handle whose DER layout drifts from the canonical
//! form is rejected instead of silently re-sliced.

use std::fmt;

use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use zeroize::Zeroizing;

use crate::encoding::{base58btc_decode, base58btc_encode, concatenate, hex_to_bytes};
use crate::error::{Error, Result};

/// Multikey prefixes from the multicodec registry, varint-encoded.
const MULTICODEC_P256_PUBLIC: [u8; 2] = [0x80, 0x24];
const MULTICODEC_P384_PUBLIC: [u8; 2] = [0x81, 0x24];
const MULTICODEC_P256_SECRET: [u8; 2] = [0x86, 0x26];
const MULTICODEC_P384_SECRET: [u8; 2] = [0x87, 0x26];

/// SPKI (RFC 5280) prefixes for EC public keys, up to and including the
/// SEC1 point tag for the uncompressed forms.
const SPKI_PREFIX_P256_UNCOMPRESSED: &str =
    "3059301306072a8648ce3d020106082a8648ce3d03010703420004";
const SPKI_PREFIX_P256_COMPRESSED: &str = "3039301306072a8648ce3d020106082a8648ce3d030107032200";
const SPKI_PREFIX_P384_UNCOMPRESSED: &str = "3076301006072a8648ce3d020106052b8104002203620004";
const SPKI_PREFIX_P384_COMPRESSED: &str = "3046301006072a8648ce3d020106052b81040022033200";

/// PKCS#8 (RFC 5958) prefixes for EC secret keys, up to the private scalar.
const PKCS8_PREFIX_P256: &str =
    "308187020100301306072a8648ce3d020106082a8648ce3d030107046d306b0201010420";
const PKCS8_PREFIX_P384: &str =
    "3081b6020100301006072a8648ce3d020106052b8104002204819e30819b0201010430";

/// ASN.1 envelope between the private scalar and the trailing uncompressed
/// public point in a PKCS#8 document.
const PKCS8_FOOTER_P256: &str = "a14403420004";
const PKCS8_FOOTER_P384: &str = "a16403620004";

/// Length of the PKCS#8 footer for both curves.
pub const PKCS8_FOOTER_LENGTH: usize = 6;

/// NIST curves supported by the ECDSA cryptosuites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    /// secp256r1, paired with SHA-256
    P256,
    /// secp384r1, paired with SHA-384
    P384,
}

impl Curve {
    /// JOSE name of the curve (`P-256` / `P-384`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
        }
    }

    /// Parse a JOSE curve name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            other => Err(Error::Encoding(format!("unsupported curve: {other}"))),
        }
    }

    /// Byte length of an uncompressed public point (`x ‖ y`).
    pub const fn uncompressed_public_length(&self) -> usize {
        match self {
            Self::P256 => 64,
            Self::P384 => 96,
        }
    }

    /// Byte length of a compressed public point (`sign ‖ x`).
    pub const fn compressed_public_length(&self) -> usize {
        match self {
            Self::P256 => 33,
            Self::P384 => 49,
        }
    }

    /// Byte length of the private scalar `d`.
    pub const fn secret_length(&self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }

    /// Byte length of a raw `r ‖ s` signature.
    pub const fn signature_length(&self) -> usize {
        match self {
            Self::P256 => 64,
            Self::P384 => 96,
        }
    }

    /// Output length of the curve's digest.
    pub const fn digest_length(&self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }

    fn multicodec_prefix(&self, flag: KeyFlag) -> [u8; 2] {
        match (self, flag) {
            (Self::P256, KeyFlag::Public) => MULTICODEC_P256_PUBLIC,
            (Self::P384, KeyFlag::Public) => MULTICODEC_P384_PUBLIC,
            (Self::P256, KeyFlag::Secret) => MULTICODEC_P256_SECRET,
            (Self::P384, KeyFlag::Secret) => MULTICODEC_P384_SECRET,
        }
    }

    fn spki_prefix(&self, compressed: bool) -> Vec<u8> {
        let hex = match (self, compressed) {
            (Self::P256, false) => SPKI_PREFIX_P256_UNCOMPRESSED,
            (Self::P256, true) => SPKI_PREFIX_P256_COMPRESSED,
            (Self::P384, false) => SPKI_PREFIX_P384_UNCOMPRESSED,
            (Self::P384, true) => SPKI_PREFIX_P384_COMPRESSED,
        };
        hex_to_bytes(hex).expect("prefix tables are valid hex")
    }

    fn pkcs8_prefix(&self) -> Vec<u8> {
        let hex = match self {
            Self::P256 => PKCS8_PREFIX_P256,
            Self::P384 => PKCS8_PREFIX_P384,
        };
        hex_to_bytes(hex).expect("prefix tables are valid hex")
    }

    fn pkcs8_footer(&self) -> Vec<u8> {
        let hex = match self {
            Self::P256 => PKCS8_FOOTER_P256,
            Self::P384 => PKCS8_FOOTER_P384,
        };
        hex_to_bytes(hex).expect("prefix tables are valid hex")
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Whether key material belongs to the public or the secret half of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFlag {
    /// Public key material (`x ‖ y`, or a compressed point)
    Public,
    /// Secret key material (the scalar `d`)
    Secret,
}

impl KeyFlag {
    /// Length of raw key material for this flag on the given curve.
    pub const fn material_length(&self, curve: Curve) -> usize {
        match self {
            Self::Public => curve.uncompressed_public_length(),
            Self::Secret => curve.secret_length(),
        }
    }

    /// Length of the multibase payload for this flag on the given curve.
    pub const fn multibase_payload_length(&self, curve: Curve) -> usize {
        match self {
            Self::Public => curve.compressed_public_length(),
            Self::Secret => curve.secret_length(),
        }
    }
}

/// An ECDSA public key handle.
#[derive(Clone, PartialEq)]
pub enum PublicKey {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
}

impl PublicKey {
    /// Curve this key belongs to.
    pub fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
        }
    }

    /// Parse a SEC1-encoded point (compressed or uncompressed).
    pub fn from_sec1_bytes(curve: Curve, bytes: &[u8]) -> Result<Self> {
        match curve {
            Curve::P256 => p256::PublicKey::from_sec1_bytes(bytes)
                .map(Self::P256)
                .map_err(|_| Error::Decoding("invalid P-256 public point".to_string())),
            Curve::P384 => p384::PublicKey::from_sec1_bytes(bytes)
                .map(Self::P384)
                .map_err(|_| Error::Decoding("invalid P-384 public point".to_string())),
        }
    }

    /// SEC1 compressed point (`0x02`/`0x03` sign byte followed by `x`).
    pub fn compressed_point(&self) -> Vec<u8> {
        match self {
            Self::P256(pk) => pk.to_encoded_point(true).as_bytes().to_vec(),
            Self::P384(pk) => pk.to_encoded_point(true).as_bytes().to_vec(),
        }
    }

    /// Uncompressed affine coordinates `x ‖ y` (the SEC1 tag byte stripped).
    pub fn uncompressed_coordinates(&self) -> Vec<u8> {
        match self {
            Self::P256(pk) => pk.to_encoded_point(false).as_bytes()[1..].to_vec(),
            Self::P384(pk) => pk.to_encoded_point(false).as_bytes()[1..].to_vec(),
        }
    }

    /// Multicodec varint prefix followed by the compressed point.
    ///
    /// For P-256 this is the 35-byte value embedded into selective-disclosure
    /// proof values.
    pub fn multicodec_bytes(&self) -> Vec<u8> {
        let prefix = self.curve().multicodec_prefix(KeyFlag::Public);
        concatenate(&[&prefix, &self.compressed_point()])
    }

    /// Parse multicodec varint prefix ‖ compressed point, the inverse of
    /// [`PublicKey::multicodec_bytes`].
    pub fn from_multicodec_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(Error::Decoding("multicodec key too short".to_string()));
        }
        let curve = match [bytes[0], bytes[1]] {
            MULTICODEC_P256_PUBLIC => Curve::P256,
            MULTICODEC_P384_PUBLIC => Curve::P384,
            _ => {
                return Err(Error::Decoding(
                    "unrecognized multicodec prefix for a public key".to_string(),
                ));
            }
        };
        Self::from_sec1_bytes(curve, &bytes[2..])
    }

    /// Export raw key material (`x ‖ y`) through the SPKI framing.
    ///
    /// The DER export must start with the canonical uncompressed SPKI prefix
    /// and carry exactly the expected total length; anything else means the
    /// handle does not hold a plain named-curve EC key.
    pub fn to_material(&self) -> Result<Vec<u8>> {
        let curve = self.curve();
        let der = match self {
            Self::P256(pk) => pk
                .to_public_key_der()
                .map_err(|e| Error::KeypairExport(format!("SPKI export failed: {e}")))?,
            Self::P384(pk) => pk
                .to_public_key_der()
                .map_err(|e| Error::KeypairExport(format!("SPKI export failed: {e}")))?,
        };
        let der = der.as_bytes();

        let prefix = curve.spki_prefix(false);
        if !der.starts_with(&prefix) {
            return Err(Error::Encoding(
                "SPKI export missing canonical DER prefix".to_string(),
            ));
        }

        let expected = prefix.len() + curve.uncompressed_public_length();
        if der.len() != expected {
            return Err(Error::KeypairExport(format!(
                "unexpected SPKI length: expected {expected} bytes, got {}",
                der.len()
            )));
        }

        Ok(der[prefix.len()..].to_vec())
    }

    /// Import raw key material (`x ‖ y`) by rebuilding the SPKI document.
    pub fn from_material(curve: Curve, material: &[u8]) -> Result<Self> {
        let expected = curve.uncompressed_public_length();
        if material.len() != expected {
            return Err(Error::InvalidKeypairLength(expected, material.len()));
        }
        let der = concatenate(&[&curve.spki_prefix(false), material]);
        Self::from_spki_der(curve, &der)
    }

    /// Encode as a Multikey string (`z` + base58btc over prefix ‖ compressed
    /// point).
    pub fn to_multikey(&self) -> Result<String> {
        material_to_multibase(&self.to_material()?, KeyFlag::Public, self.curve())
    }

    /// Decode a Multikey string, inferring the curve from its multicodec
    /// prefix.
    pub fn from_multikey(multikey: &str) -> Result<Self> {
        let (curve, flag, payload) = decode_multikey(multikey)?;
        if flag != KeyFlag::Public {
            return Err(Error::InvalidKeypairContent(
                "multikey encodes a secret key where a public key was expected".to_string(),
            ));
        }
        Self::from_sec1_bytes(curve, &payload)
    }

    /// Verify a raw `r ‖ s` signature over `data`, hashed with the curve
    /// digest.
    ///
    /// Malformed signatures verify as `false` rather than erroring.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::P256(pk) => {
                use p256::ecdsa::signature::Verifier;
                let Ok(signature) = p256::ecdsa::Signature::from_slice(signature) else {
                    return false;
                };
                p256::ecdsa::VerifyingKey::from(pk)
                    .verify(data, &signature)
                    .is_ok()
            }
            Self::P384(pk) => {
                use p384::ecdsa::signature::Verifier;
                let Ok(signature) = p384::ecdsa::Signature::from_slice(signature) else {
                    return false;
                };
                p384::ecdsa::VerifyingKey::from(pk)
                    .verify(data, &signature)
                    .is_ok()
            }
        }
    }

    fn from_spki_der(curve: Curve, der: &[u8]) -> Result<Self> {
        match curve {
            Curve::P256 => p256::PublicKey::from_public_key_der(der)
                .map(Self::P256)
                .map_err(|e| Error::KeypairImport(format!("SPKI import failed: {e}"))),
            Curve::P384 => p384::PublicKey::from_public_key_der(der)
                .map(Self::P384)
                .map_err(|e| Error::KeypairImport(format!("SPKI import failed: {e}"))),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_multikey() {
            Ok(multikey) => write!(f, "PublicKey({multikey})"),
            Err(_) => write!(f, "PublicKey(<invalid>)"),
        }
    }
}

/// An ECDSA secret key handle.
///
/// The wrapped scalar is zeroized on drop by the curve crates.
#[derive(Clone)]
pub enum SecretKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
}

impl SecretKey {
    /// Curve this key belongs to.
    pub fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
        }
    }

    /// Generate a fresh random secret key on the given curve.
    pub fn generate(curve: Curve) -> Self {
        let mut rng = rand::rngs::OsRng;
        match curve {
            Curve::P256 => Self::P256(p256::SecretKey::random(&mut rng)),
            Curve::P384 => Self::P384(p384::SecretKey::random(&mut rng)),
        }
    }

    /// Derive the public half by scalar-multiplying the base point.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::P256(sk) => PublicKey::P256(sk.public_key()),
            Self::P384(sk) => PublicKey::P384(sk.public_key()),
        }
    }

    /// Export the raw scalar `d` through the PKCS#8 framing.
    ///
    /// The DER export is validated against the canonical prefix, the footer
    /// envelope, and the exact total length before the scalar is sliced out.
    pub fn to_material(&self) -> Result<Vec<u8>> {
        let curve = self.curve();
        let der = match self {
            Self::P256(sk) => sk
                .to_pkcs8_der()
                .map_err(|e| Error::KeypairExport(format!("PKCS#8 export failed: {e}")))?,
            Self::P384(sk) => sk
                .to_pkcs8_der()
                .map_err(|e| Error::KeypairExport(format!("PKCS#8 export failed: {e}")))?,
        };
        let der = der.as_bytes();

        let prefix = curve.pkcs8_prefix();
        if !der.starts_with(&prefix) {
            return Err(Error::Encoding(
                "PKCS#8 export missing canonical DER prefix".to_string(),
            ));
        }

        let secret_len = curve.secret_length();
        let expected =
            prefix.len() + secret_len + PKCS8_FOOTER_LENGTH + curve.uncompressed_public_length();
        if der.len() != expected {
            return Err(Error::KeypairExport(format!(
                "unexpected PKCS#8 length: expected {expected} bytes, got {}",
                der.len()
            )));
        }

        let footer_start = prefix.len() + secret_len;
        if der[footer_start..footer_start + PKCS8_FOOTER_LENGTH] != curve.pkcs8_footer() {
            return Err(Error::KeypairExport(
                "unexpected PKCS#8 envelope before trailing public point".to_string(),
            ));
        }

        Ok(der[prefix.len()..footer_start].to_vec())
    }

    /// Import the raw scalar `d`, re-deriving the public point from it.
    pub fn from_material(curve: Curve, material: &[u8]) -> Result<Self> {
        let expected = curve.secret_length();
        if material.len() != expected {
            return Err(Error::InvalidKeypairLength(expected, material.len()));
        }
        match curve {
            Curve::P256 => p256::SecretKey::from_slice(material)
                .map(Self::P256)
                .map_err(|_| Error::Decoding("invalid P-256 secret scalar".to_string())),
            Curve::P384 => p384::SecretKey::from_slice(material)
                .map(Self::P384)
                .map_err(|_| Error::Decoding("invalid P-384 secret scalar".to_string())),
        }
    }

    /// Encode as a Multikey string (`z` + base58btc over prefix ‖ `d`).
    pub fn to_multikey(&self) -> Result<String> {
        let material = Zeroizing::new(self.to_material()?);
        material_to_multibase(&material, KeyFlag::Secret, self.curve())
    }

    /// Decode a Multikey string, inferring the curve from its multicodec
    /// prefix.
    pub fn from_multikey(multikey: &str) -> Result<Self> {
        let (curve, flag, payload) = decode_multikey(multikey)?;
        if flag != KeyFlag::Secret {
            return Err(Error::InvalidKeypairContent(
                "multikey encodes a public key where a secret key was expected".to_string(),
            ));
        }
        Self::from_material(curve, &payload)
    }

    /// Produce a raw `r ‖ s` signature over `data`, hashed with the curve
    /// digest.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::P256(sk) => {
                use p256::ecdsa::signature::Signer;
                let signing_key = p256::ecdsa::SigningKey::from(sk);
                let signature: p256::ecdsa::Signature = signing_key.sign(data);
                signature.to_bytes().to_vec()
            }
            Self::P384(sk) => {
                use p384::ecdsa::signature::Signer;
                let signing_key = p384::ecdsa::SigningKey::from(sk);
                let signature: p384::ecdsa::Signature = signing_key.sign(data);
                signature.to_bytes().to_vec()
            }
        }
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(<redacted>)")
    }
}

/// Encode raw key material as a Multikey string.
///
/// Public material is compressed to `sign ‖ x` first; secret material is the
/// scalar `d` used verbatim.
pub fn material_to_multibase(material: &[u8], flag: KeyFlag, curve: Curve) -> Result<String> {
    let expected = flag.material_length(curve);
    if material.len() != expected {
        return Err(Error::InvalidKeypairLength(expected, material.len()));
    }

    let payload = match flag {
        KeyFlag::Public => {
            let (x, y) = material.split_at(curve.secret_length());
            let sign = if y[y.len() - 1] & 1 == 1 { 0x03 } else { 0x02 };
            concatenate(&[&[sign], x])
        }
        KeyFlag::Secret => material.to_vec(),
    };

    let prefix = curve.multicodec_prefix(flag);
    Ok(base58btc_encode(&concatenate(&[&prefix, &payload])))
}

/// Decode a Multikey string back into raw key material.
///
/// The inverse of [`material_to_multibase`]: compressed public points are
/// decompressed back to `x ‖ y` by importing them through the compressed
/// SPKI framing.
pub fn multibase_to_material(multikey: &str, flag: KeyFlag, curve: Curve) -> Result<Vec<u8>> {
    let bytes = base58btc_decode(multikey)?;
    let prefix = curve.multicodec_prefix(flag);
    if bytes.len() < 2 || bytes[..2] != prefix {
        return Err(Error::Decoding(format!(
            "invalid multicodec prefix for a {} {} key",
            curve,
            match flag {
                KeyFlag::Public => "public",
                KeyFlag::Secret => "secret",
            }
        )));
    }

    let payload = &bytes[2..];
    let expected = flag.multibase_payload_length(curve);
    if payload.len() != expected {
        return Err(Error::InvalidKeypairLength(expected, payload.len()));
    }

    match flag {
        KeyFlag::Secret => Ok(payload.to_vec()),
        KeyFlag::Public => {
            let der = concatenate(&[&curve.spki_prefix(true), payload]);
            let key = PublicKey::from_spki_der(curve, &der)?;
            Ok(key.uncompressed_coordinates())
        }
    }
}

/// Split a Multikey string into its curve, flag, and raw payload.
pub(crate) fn decode_multikey(multikey: &str) -> Result<(Curve, KeyFlag, Vec<u8>)> {
    let bytes = base58btc_decode(multikey)?;
    if bytes.len() < 2 {
        return Err(Error::Decoding("multikey too short".to_string()));
    }

    let (curve, flag) = match [bytes[0], bytes[1]] {
        MULTICODEC_P256_PUBLIC => (Curve::P256, KeyFlag::Public),
        MULTICODEC_P384_PUBLIC => (Curve::P384, KeyFlag::Public),
        MULTICODEC_P256_SECRET => (Curve::P256, KeyFlag::Secret),
        MULTICODEC_P384_SECRET => (Curve::P384, KeyFlag::Secret),
        _ => {
            return Err(Error::Decoding(
                "unrecognized multicodec prefix".to_string(),
            ));
        }
    };

    let payload = bytes[2..].to_vec();
    let expected = flag.multibase_payload_length(curve);
    if payload.len() != expected {
        return Err(Error::InvalidKeypairLength(expected, payload.len()));
    }

    Ok((curve, flag, payload))
}
