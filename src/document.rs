use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::error::{Error, Result};
use crate::proof::Proof;

/// A JSON-LD document moving through the proof pipelines.
///
/// The suites only ever look at three regions of a document: the claims
/// (everything except `proof`), the `@context` a proof configuration
/// inherits, and the embedded proof. The accessors below carve out exactly
/// those regions and enforce the shapes this crate secures: an object root,
/// a JSON-LD-shaped `@context`, and at most one proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    claims: Map<String, Value>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self { claims: Map::new() }
    }

    /// Load a document from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Self::from_json_value(value)
    }

    /// Parse a document from a JSON string
    pub fn from_json_string(json: &str) -> Result<Self> {
        Self::from_json_value(serde_json::from_str(json)?)
    }

    /// Build a document from a JSON value.
    ///
    /// The root must be an object, and `@context`, when present, must have
    /// a JSON-LD context shape (string, object, or array).
    pub fn from_json_value(value: Value) -> Result<Self> {
        let Value::Object(claims) = value else {
            return Err(Error::Decoding(
                "document root must be a JSON object".to_string(),
            ));
        };

        match claims.get("@context") {
            None | Some(Value::String(_)) | Some(Value::Object(_)) | Some(Value::Array(_)) => {}
            Some(_) => {
                return Err(Error::Decoding(
                    "@context must be a string, object, or array".to_string(),
                ));
            }
        }

        Ok(Self { claims })
    }

    /// Save the document to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Render the document as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The document as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// A claim by name
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }

    /// Whether a claim is present
    pub fn contains(&self, key: &str) -> bool {
        self.claims.contains_key(key)
    }

    /// Set a claim, replacing any existing value
    pub fn set(&mut self, key: &str, value: Value) {
        self.claims.insert(key.to_string(), value);
    }

    /// The `@context` a proof configuration inherits from this document
    pub fn context(&self) -> Option<&Value> {
        self.claims.get("@context")
    }

    /// The proof securing this document, if any.
    ///
    /// A singleton proof set (`"proof": [ { … } ]`) is unwrapped. The ECDSA
    /// suites secure one proof at a time, so larger sets and malformed
    /// proofs are rejected rather than skipped.
    pub fn proof(&self) -> Result<Option<Proof>> {
        let Some(member) = self.claims.get("proof") else {
            return Ok(None);
        };

        let proof = match member {
            Value::Array(set) if set.len() == 1 => &set[0],
            Value::Array(set) => {
                return Err(Error::ProofVerification(format!(
                    "expected a single proof, found a set of {}",
                    set.len()
                )));
            }
            other => other,
        };

        serde_json::from_value(proof.clone())
            .map(Some)
            .map_err(|e| Error::ProofVerification(format!("malformed proof: {e}")))
    }

    /// The document with any proof removed
    pub fn without_proof(&self) -> Self {
        let claims = self
            .claims
            .iter()
            .filter(|(key, _)| key.as_str() != "proof")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Self { claims }
    }

    /// Attach a finished proof, replacing any existing one.
    ///
    /// Only a proof carrying a `proofValue` may be embedded; a bare proof
    /// configuration never leaves the pipeline. The embedded proof sheds
    /// any standalone `@context`, since it inherits the document's.
    pub fn with_proof(&self, proof: &Proof) -> Result<Self> {
        if proof.proof_value.is_none() {
            return Err(Error::ProofGeneration(
                "refusing to embed a proof without a proofValue".to_string(),
            ));
        }

        let mut value = serde_json::to_value(proof)?;
        if let Value::Object(map) = &mut value {
            map.remove("@context");
        }

        let mut secured = self.without_proof();
        secured.claims.insert("proof".to_string(), value);
        Ok(secured)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_document() -> Document {
        let json = r#"{
            "@context": [
                "https://www.w3.org/ns/credentials/v2",
                {"myWebsite": "https://vocabulary.example/myWebsite"}
            ],
            "myWebsite": "https://hello.world.example/"
        }"#;
        Document::from_json_string(json).expect("Failed to create test document")
    }

    fn test_proof() -> Proof {
        serde_json::from_value(serde_json::json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "ecdsa-rdfc-2019",
            "proofPurpose": "assertionMethod",
            "verificationMethod": "did:example:issuer#key-1",
            "proofValue": "z3FXQ"
        }))
        .unwrap()
    }

    #[test]
    fn test_document_serialization() {
        let doc = test_document();
        let json = doc.to_json_string().expect("Failed to serialize document");
        let doc2 = Document::from_json_string(&json).expect("Failed to deserialize document");
        assert_eq!(doc, doc2);
    }

    #[test]
    fn test_document_rejects_non_object_root() {
        assert!(Document::from_json_string("[1, 2, 3]").is_err());
        assert!(Document::from_json_string("\"text\"").is_err());
    }

    #[test]
    fn test_document_rejects_malformed_context() {
        assert!(matches!(
            Document::from_json_string(r#"{"@context": 7}"#),
            Err(Error::Decoding(_))
        ));
        assert!(Document::from_json_string(r#"{"@context": "https://w.example/v1"}"#).is_ok());
    }

    #[test]
    fn test_document_io() {
        let document = test_document();

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("test_document.json");

        document
            .to_file(&file_path)
            .expect("Failed to save document");
        let loaded = Document::from_file(&file_path).expect("Failed to load document");

        assert_eq!(document, loaded);
    }

    #[test]
    fn test_proof_attach_and_strip() {
        let document = test_document();
        assert!(document.proof().unwrap().is_none());

        let secured = document.with_proof(&test_proof()).unwrap();
        assert_eq!(secured.proof().unwrap().unwrap(), test_proof());
        assert_eq!(secured.without_proof(), document);
    }

    #[test]
    fn test_attached_proof_sheds_its_context() {
        let mut proof = test_proof();
        proof.context = Some(serde_json::json!(["https://w3id.org/security/data-integrity/v2"]));

        let secured = test_document().with_proof(&proof).unwrap();
        assert!(secured.get("proof").unwrap().get("@context").is_none());
    }

    #[test]
    fn test_bare_configuration_cannot_be_attached() {
        let mut configuration = test_proof();
        configuration.proof_value = None;
        assert!(matches!(
            test_document().with_proof(&configuration),
            Err(Error::ProofGeneration(_))
        ));
    }

    #[test]
    fn test_singleton_proof_set_is_unwrapped() {
        let mut document = test_document();
        document.set(
            "proof",
            Value::Array(vec![serde_json::to_value(test_proof()).unwrap()]),
        );
        assert_eq!(document.proof().unwrap().unwrap(), test_proof());
    }

    #[test]
    fn test_larger_proof_sets_are_rejected() {
        let mut document = test_document();
        let proof = serde_json::to_value(test_proof()).unwrap();
        document.set("proof", Value::Array(vec![proof.clone(), proof]));
        assert!(matches!(
            document.proof(),
            Err(Error::ProofVerification(_))
        ));
    }

    #[test]
    fn test_malformed_proof_is_an_error() {
        let mut document = test_document();
        document.set("proof", serde_json::json!({"type": 7}));
        assert!(matches!(
            document.proof(),
            Err(Error::ProofVerification(_))
        ));
    }

    #[test]
    fn test_context_accessor() {
        let document = test_document();
        assert!(document.context().unwrap().is_array());
        assert!(Document::new().context().is_none());
    }
}
