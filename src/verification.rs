//! Verification methods and their resolution.
//!
//! Suites never fetch verification methods themselves; they go through the
//! [`VerificationMethodResolver`] seam so callers can plug in DID resolution,
//! an HTTP loader, or the bundled in-memory resolver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::jwk::JsonWebKey;
use crate::keypair::ECKeypair;

/// JSON-LD context for Multikey verification methods.
pub const MULTIKEY_CONTEXT: &str = "https://w3id.org/security/multikey/v1";

/// JSON-LD context for JsonWebKey verification methods.
pub const JWK_CONTEXT: &str = "https://w3id.org/security/jwk/v1";

/// A verification method, in one of the two shapes the ECDSA suites accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerificationMethod {
    /// Multibase-encoded key material
    Multikey(MultikeyMethod),
    /// JWK-encoded key material
    JsonWebKey(JsonWebKeyMethod),
}

/// A `Multikey` verification method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultikeyMethod {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Identifier, a URI ending in `#fragment`
    pub id: String,

    /// Controller URI; `id` must start with it
    pub controller: String,

    /// Expiry timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// Revocation timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<String>,

    /// Public key, `z`-prefixed base58btc over multicodec ‖ compressed point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,

    /// Secret key, `z`-prefixed base58btc over multicodec ‖ scalar
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key_multibase: Option<String>,
}

/// A `JsonWebKey` verification method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonWebKeyMethod {
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Identifier, a URI ending in `#fragment`
    pub id: String,

    /// Controller URI; `id` must start with it
    pub controller: String,

    /// Expiry timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// Revocation timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<String>,

    /// Public EC JWK
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<JsonWebKey>,

    /// Secret EC JWK (includes `d`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key_jwk: Option<JsonWebKey>,
}

impl VerificationMethod {
    /// Identifier of the method.
    pub fn id(&self) -> &str {
        match self {
            Self::Multikey(m) => &m.id,
            Self::JsonWebKey(m) => &m.id,
        }
    }

    /// Controller of the method.
    pub fn controller(&self) -> &str {
        match self {
            Self::Multikey(m) => &m.controller,
            Self::JsonWebKey(m) => &m.controller,
        }
    }

    /// JSON-LD context carried by the method, if any.
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Multikey(m) => m.context.as_deref(),
            Self::JsonWebKey(m) => m.context.as_deref(),
        }
    }

    /// Expiry timestamp, if any.
    pub fn expires(&self) -> Option<&str> {
        match self {
            Self::Multikey(m) => m.expires.as_deref(),
            Self::JsonWebKey(m) => m.expires.as_deref(),
        }
    }

    /// Revocation timestamp, if any.
    pub fn revoked(&self) -> Option<&str> {
        match self {
            Self::Multikey(m) => m.revoked.as_deref(),
            Self::JsonWebKey(m) => m.revoked.as_deref(),
        }
    }
}

/// Trait for resolving verification methods and signing keys
pub trait VerificationMethodResolver {
    /// Resolve a verification method by ID
    fn resolve(&self, verification_method_id: &str) -> Result<VerificationMethod>;

    /// Resolve the keypair used to sign under a verification method
    fn resolve_signing_key(&self, verification_method_id: &str) -> Result<ECKeypair>;

    /// Check whether a verification method can be resolved
    fn supports(&self, verification_method_id: &str) -> bool;
}

/// In-memory resolver for testing and simple use cases
///
/// Stores verification methods and signing keypairs keyed by their
/// verification method ID.
#[derive(Debug, Default)]
pub struct InMemoryResolver {
    methods: HashMap<String, VerificationMethod>,
    signing_keys: HashMap<String, ECKeypair>,
}

impl InMemoryResolver {
    /// Create a new empty in-memory resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a verification method, keyed by its ID
    pub fn add_method(&mut self, method: VerificationMethod) {
        self.methods.insert(method.id().to_string(), method);
    }

    /// Add a signing keypair
    ///
    /// The keypair must carry an ID. Its public Multikey verification method
    /// is registered alongside so the same ID verifies what it signs.
    pub fn add_signing_key(&mut self, keypair: ECKeypair) -> Result<()> {
        let id = keypair
            .id
            .clone()
            .ok_or_else(|| Error::InvalidKeypairContent("signing keypair has no id".to_string()))?;

        let method = keypair.export(&crate::keypair::ExportOptions {
            method_type: crate::keypair::MethodType::Multikey,
            flag: crate::key::KeyFlag::Public,
        })?;

        self.methods.insert(id.clone(), method);
        self.signing_keys.insert(id, keypair);
        Ok(())
    }

    /// Remove a verification method and any signing key stored under the ID
    pub fn remove(&mut self, verification_method_id: &str) {
        self.methods.remove(verification_method_id);
        self.signing_keys.remove(verification_method_id);
    }

    /// Number of verification methods stored
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

impl VerificationMethodResolver for InMemoryResolver {
    fn resolve(&self, verification_method_id: &str) -> Result<VerificationMethod> {
        self.methods
            .get(verification_method_id)
            .cloned()
            .ok_or_else(|| {
                Error::InvalidVerificationMethod(format!(
                    "verification method not found: {verification_method_id}"
                ))
            })
    }

    fn resolve_signing_key(&self, verification_method_id: &str) -> Result<ECKeypair> {
        self.signing_keys
            .get(verification_method_id)
            .cloned()
            .ok_or_else(|| {
                Error::InvalidVerificationMethod(format!(
                    "no signing key for verification method: {verification_method_id}"
                ))
            })
    }

    fn supports(&self, verification_method_id: &str) -> bool {
        self.methods.contains_key(verification_method_id)
    }
}
