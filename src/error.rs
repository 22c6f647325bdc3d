use onlyerror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum Error {
    /// Error during document I/O operations
    #[error("Document I/O error")]
    DocumentIo(#[from] io::Error),

    /// Error parsing JSON document
    #[error("JSON parse error")]
    JsonParse(#[from] serde_json::Error),

    /// Error encoding key material (bad curve, missing DER prefix)
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error decoding multibase/base64 input or a malformed JWK
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Malformed verification method or missing key for the requested operation
    #[error("Invalid keypair content: {0}")]
    InvalidKeypairContent(String),

    /// Key material of the wrong length for the declared curve and flag
    #[error("Invalid key material length: expected {0} bytes, got {1}")]
    InvalidKeypairLength(usize, usize),

    /// DER export produced an unexpected layout
    #[error("Keypair export error: {0}")]
    KeypairExport(String),

    /// Unsupported or malformed document on keypair import
    #[error("Keypair import error: {0}")]
    KeypairImport(String),

    /// Keypair `expires` or `revoked` date lies in the past
    #[error("Keypair expired: {0}")]
    KeypairExpired(String),

    /// Wrong `type` or `cryptosuite` on entry to a suite
    #[error("Proof transformation error: {0}")]
    ProofTransformation(String),

    /// Invalid proof configuration during signing
    #[error("Proof generation error: {0}")]
    ProofGeneration(String),

    /// Malformed or inconsistent proof during verification
    #[error("Proof verification error: {0}")]
    ProofVerification(String),

    /// Resolved verification method lacks the required key
    #[error("Invalid verification method: {0}")]
    InvalidVerificationMethod(String),

    /// Error from an external canonicalization collaborator
    #[error("Canonicalization error: {0}")]
    Canonicalization(String),

    /// Error from the document loader
    #[error("Document loader error: {0}")]
    DocumentLoader(String),
}

/// Result type for this crate
pub type Result<T> = std::result::Result<T, Error>;
