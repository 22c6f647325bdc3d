use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::{Error, Result};

/// Types of proofs supported by the library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// General Data Integrity Proof
    DataIntegrityProof,
    /// Other types
    #[serde(other)]
    Other,
}

impl Default for ProofType {
    fn default() -> Self {
        Self::DataIntegrityProof
    }
}

/// Purposes for cryptographic proofs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// Authentication of the entity identified by the controller
    Authentication,
    /// Assertion method for making verifiable claims
    AssertionMethod,
    /// Capability invocation
    CapabilityInvocation,
    /// Capability delegation
    CapabilityDelegation,
    /// Other purposes
    #[serde(untagged)]
    Other(String),
}

/// Represents a Data Integrity proof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Optional identifier for the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Type of proof
    #[serde(rename = "type")]
    pub type_: ProofType,

    /// Purpose of the proof
    pub proof_purpose: String,

    /// Verification method that can be used to verify the proof
    pub verification_method: String,

    /// Cryptographic suite used for the proof
    pub cryptosuite: String,

    /// When the proof was created (ISO 8601 dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// When the proof expires (ISO 8601 dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// Security domain for the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Challenge to prevent replay attacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    /// Proof value (encoded binary data); absent on a bare proof
    /// configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,

    /// JSON-LD context inherited from the secured document
    #[serde(rename = "@context", skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Proof {
    /// The encoded proof value, or a verification error when absent.
    pub fn require_proof_value(&self) -> Result<&str> {
        self.proof_value.as_deref().ok_or_else(|| {
            Error::ProofVerification("proof does not carry a proofValue".to_string())
        })
    }

    /// Rebuild the proof options this proof was configured from.
    ///
    /// `proofValue` has no options counterpart, so it never round-trips.
    pub fn to_options(&self) -> Result<ProofOptions> {
        let options = serde_json::from_value(serde_json::to_value(self)?)?;
        Ok(options)
    }
}

/// The proof-configuration fields a caller supplies when creating a proof.
///
/// These are exactly the proof members that get canonicalized and signed;
/// `proofValue` is deliberately unrepresentable here. `type` and
/// `cryptosuite` may be left unset and are filled in by the suite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOptions {
    /// Optional identifier for the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Proof type; must be `DataIntegrityProof` once defaulted
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// Cryptosuite name; must match the suite once defaulted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cryptosuite: Option<String>,

    /// Purpose of the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    /// Verification method the proof will be verified against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<String>,

    /// When the proof was created (ISO 8601 dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// When the proof expires (ISO 8601 dateTime)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    /// Security domain for the proof
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Challenge to prevent replay attacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

impl ProofOptions {
    /// Create a new empty set of proof options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the proof type (default is "DataIntegrityProof")
    pub fn with_type(mut self, type_: &str) -> Self {
        self.type_ = Some(type_.to_string());
        self
    }

    /// Set the cryptosuite
    pub fn with_cryptosuite(mut self, cryptosuite: &str) -> Self {
        self.cryptosuite = Some(cryptosuite.to_string());
        self
    }

    /// Set the verification method
    pub fn with_verification_method(mut self, method: &str) -> Self {
        self.verification_method = Some(method.to_string());
        self
    }

    /// Set the proof purpose
    pub fn with_proof_purpose(mut self, purpose: &str) -> Self {
        self.proof_purpose = Some(purpose.to_string());
        self
    }

    /// Set the creation date
    pub fn with_created(mut self, created: &str) -> Self {
        self.created = Some(created.to_string());
        self
    }

    /// Set the expiration date
    pub fn with_expires(mut self, expires: &str) -> Self {
        self.expires = Some(expires.to_string());
        self
    }

    /// Set the security domain
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    /// Set the challenge
    pub fn with_challenge(mut self, challenge: &str) -> Self {
        self.challenge = Some(challenge.to_string());
        self
    }

    /// The `verificationMethod` option, required for signing
    pub fn verification_method(&self) -> Result<&str> {
        self.verification_method.as_deref().ok_or_else(|| {
            Error::ProofGeneration("missing verificationMethod in proof options".to_string())
        })
    }

    /// Fill in the `type` and `cryptosuite` defaults for a suite.
    pub(crate) fn with_defaults(&self, cryptosuite: &str) -> Self {
        let mut options = self.clone();
        if options.type_.is_none() {
            options.type_ = Some("DataIntegrityProof".to_string());
        }
        if options.cryptosuite.is_none() {
            options.cryptosuite = Some(cryptosuite.to_string());
        }
        options
    }

    /// Check that `type` and `cryptosuite` name the given suite.
    pub(crate) fn validate_suite(
        &self,
        cryptosuite: &str,
        make_error: fn(String) -> Error,
    ) -> Result<()> {
        match self.type_.as_deref() {
            Some("DataIntegrityProof") => {}
            Some(other) => return Err(make_error(format!("unsupported proof type: {other}"))),
            None => return Err(make_error("proof options must include 'type'".to_string())),
        }

        match self.cryptosuite.as_deref() {
            Some(suite) if suite == cryptosuite => {}
            Some(suite) => return Err(make_error(format!("unsupported cryptosuite: {suite}"))),
            None => {
                return Err(make_error(
                    "proof options must include 'cryptosuite'".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Reject a `created` option that does not parse as an RFC 3339
    /// datetime.
    pub(crate) fn validate_created(&self) -> Result<()> {
        match &self.created {
            None => Ok(()),
            Some(created) => DateTime::parse_from_rfc3339(created)
                .map(|_| ())
                .map_err(|e| {
                    Error::ProofGeneration(format!("invalid 'created' datetime `{created}`: {e}"))
                }),
        }
    }

    /// The proof configuration to canonicalize: the options plus the
    /// secured document's `@context`.
    pub(crate) fn to_config_value(&self, context: Option<Value>) -> Result<Value> {
        let Value::Object(mut config) = serde_json::to_value(self)? else {
            return Err(Error::ProofGeneration(
                "proof options must serialize to an object".to_string(),
            ));
        };
        if let Some(context) = context {
            config.insert("@context".to_string(), context);
        }
        Ok(Value::Object(config))
    }

    /// Finish the options into a proof carrying `proof_value`.
    pub(crate) fn to_proof(&self, proof_value: String) -> Result<Proof> {
        let proof_purpose = self.proof_purpose.clone().ok_or_else(|| {
            Error::ProofGeneration("missing proofPurpose in proof options".to_string())
        })?;
        let verification_method = self.verification_method()?.to_string();
        let cryptosuite = self.cryptosuite.clone().ok_or_else(|| {
            Error::ProofGeneration("missing cryptosuite in proof options".to_string())
        })?;

        Ok(Proof {
            id: self.id.clone(),
            type_: ProofType::DataIntegrityProof,
            proof_purpose,
            verification_method,
            cryptosuite,
            created: self.created.clone(),
            expires: self.expires.clone(),
            domain: self.domain.clone(),
            challenge: self.challenge.clone(),
            proof_value: Some(proof_value),
            context: None,
        })
    }
}

/// Result of verifying a proof
#[derive(Debug, Clone)]
pub struct VerificationResult {
    /// Whether the proof is valid
    pub verified: bool,

    /// The verified document (if verification succeeded)
    pub verified_document: Option<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proof() -> Proof {
        serde_json::from_value(serde_json::json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "ecdsa-rdfc-2019",
            "proofPurpose": "assertionMethod",
            "verificationMethod": "did:example:issuer#key-1",
            "created": "2023-02-24T23:36:38Z",
            "proofValue": "z3FXQ"
        }))
        .unwrap()
    }

    #[test]
    fn test_proof_serde_round_trip() {
        let proof = sample_proof();
        let value = serde_json::to_value(&proof).unwrap();
        assert_eq!(value["type"], "DataIntegrityProof");
        assert_eq!(value["proofPurpose"], "assertionMethod");
        let restored: Proof = serde_json::from_value(value).unwrap();
        assert_eq!(restored, proof);
    }

    #[test]
    fn test_unknown_proof_type_is_other() {
        let proof: Proof = serde_json::from_value(serde_json::json!({
            "type": "Ed25519Signature2020",
            "cryptosuite": "eddsa-2022",
            "proofPurpose": "assertionMethod",
            "verificationMethod": "did:example:issuer#key-1",
            "proofValue": "z3FXQ"
        }))
        .unwrap();
        assert_eq!(proof.type_, ProofType::Other);
    }

    #[test]
    fn test_to_options_drops_proof_value() {
        let options = sample_proof().to_options().unwrap();
        assert_eq!(
            options.verification_method().unwrap(),
            "did:example:issuer#key-1"
        );
        assert_eq!(options.created.as_deref(), Some("2023-02-24T23:36:38Z"));

        // and the rebuilt proof matches the original
        let rebuilt = options.to_proof("z3FXQ".to_string()).unwrap();
        assert_eq!(rebuilt, sample_proof());
    }

    #[test]
    fn test_require_proof_value() {
        let mut proof = sample_proof();
        assert!(proof.require_proof_value().is_ok());
        proof.proof_value = None;
        assert!(matches!(
            proof.require_proof_value(),
            Err(Error::ProofVerification(_))
        ));
    }

    #[test]
    fn test_with_defaults_fills_type_and_cryptosuite() {
        let options = ProofOptions::new()
            .with_verification_method("did:example:issuer#key-1")
            .with_defaults("ecdsa-jcs-2019");
        assert_eq!(options.type_.as_deref(), Some("DataIntegrityProof"));
        assert_eq!(options.cryptosuite.as_deref(), Some("ecdsa-jcs-2019"));

        // explicit values are left alone
        let options = ProofOptions::new()
            .with_cryptosuite("ecdsa-rdfc-2019")
            .with_defaults("ecdsa-jcs-2019");
        assert_eq!(options.cryptosuite.as_deref(), Some("ecdsa-rdfc-2019"));
    }

    #[test]
    fn test_validate_suite() {
        let options = ProofOptions::new()
            .with_type("DataIntegrityProof")
            .with_cryptosuite("ecdsa-rdfc-2019");
        assert!(options
            .validate_suite("ecdsa-rdfc-2019", Error::ProofTransformation)
            .is_ok());
        assert!(matches!(
            options.validate_suite("ecdsa-jcs-2019", Error::ProofTransformation),
            Err(Error::ProofTransformation(_))
        ));
        assert!(matches!(
            ProofOptions::new().validate_suite("ecdsa-rdfc-2019", Error::ProofGeneration),
            Err(Error::ProofGeneration(_))
        ));
    }

    #[test]
    fn test_validate_created() {
        assert!(ProofOptions::new()
            .with_created("2023-02-24T23:36:38Z")
            .validate_created()
            .is_ok());
        assert!(matches!(
            ProofOptions::new().with_created("last tuesday").validate_created(),
            Err(Error::ProofGeneration(_))
        ));

        // absent is fine
        assert!(ProofOptions::new().validate_created().is_ok());
    }

    #[test]
    fn test_config_value_inherits_context() {
        let options = ProofOptions::new()
            .with_type("DataIntegrityProof")
            .with_cryptosuite("ecdsa-rdfc-2019")
            .with_proof_purpose("assertionMethod");
        let context = serde_json::json!(["https://www.w3.org/ns/credentials/v2"]);
        let config = options.to_config_value(Some(context.clone())).unwrap();

        assert_eq!(config["@context"], context);
        assert_eq!(config["cryptosuite"], "ecdsa-rdfc-2019");
        assert!(config.get("verificationMethod").is_none());
        assert!(config.get("proofValue").is_none());
    }

    #[test]
    fn test_to_proof_requires_purpose_and_method() {
        let options = ProofOptions::new()
            .with_type("DataIntegrityProof")
            .with_cryptosuite("ecdsa-rdfc-2019")
            .with_verification_method("did:example:issuer#key-1");
        assert!(matches!(
            options.to_proof("zSig".to_string()),
            Err(Error::ProofGeneration(_))
        ));

        let options = options.with_proof_purpose("assertionMethod");
        let proof = options.to_proof("zSig".to_string()).unwrap();
        assert_eq!(proof.proof_value.as_deref(), Some("zSig"));
        assert_eq!(proof.type_, ProofType::DataIntegrityProof);
    }
}
