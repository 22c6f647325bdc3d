//! # ECDSA Data Integrity
//!
//! This crate implements the ECDSA Data Integrity cryptographic suites,
//! providing functionality to create and verify cryptographic proofs for
//! JSON-LD documents using ECDSA over the NIST P-256 and P-384 curves.
//!
//! Three cryptographic suites are supported:
//! - `ecdsa-rdfc-2019`: RDF Dataset Canonicalization followed by ECDSA
//! - `ecdsa-jcs-2019`: JSON Canonicalization Scheme followed by ECDSA
//! - `ecdsa-sd-2023`: selective disclosure with per-statement signatures,
//!   letting a holder reveal a subset of a signed document
//!
//! RDF canonicalization, JSON-LD loading, and JSON-Pointer selection are
//! consumed through the traits in [`canonicalize`]; bring an implementation
//! of those to use the RDFC and selective-disclosure suites.
//!
//! ## Example
//! ```rust,no_run
//! use vc_di_ecdsa::{CryptoSuite, Curve, Document, ECKeypair, InMemoryResolver, ProofOptions};
//! use vc_di_ecdsa::suites::ecdsa_jcs::EcdsaJcsSuite;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load a credential from a file
//! let document = Document::from_file("path/to/credential.json")?;
//!
//! // Create an issuer keypair and register it with a resolver
//! let mut keypair = ECKeypair::new(Curve::P256);
//! keypair.controller = Some("did:example:issuer".to_string());
//! keypair.initialize()?;
//! let verification_method = keypair.id.clone().unwrap();
//!
//! let mut resolver = InMemoryResolver::new();
//! resolver.add_signing_key(keypair)?;
//!
//! // Create proof options
//! let options = ProofOptions::new()
//!     .with_verification_method(&verification_method)
//!     .with_proof_purpose("assertionMethod");
//!
//! // Sign and verify
//! let suite = EcdsaJcsSuite::new(Curve::P256, &resolver);
//! let secured = suite.create_proof(&document, &options)?;
//! assert!(suite.verify_proof(&secured)?.verified);
//! # Ok(())
//! # }
//! ```

pub mod canonicalize;
pub mod cryptosuite;
pub mod document;
pub mod encoding;
pub mod error;
pub mod hash;
pub mod jwk;
pub mod key;
pub mod keypair;
pub mod proof;
pub mod selective;
pub mod suites;
pub mod verification;

// Re-exports of key components
pub use cryptosuite::{instantiate_cryptosuite, CryptoSuite};
pub use document::Document;
pub use error::{Error, Result};
pub use jwk::JsonWebKey;
pub use key::{Curve, KeyFlag, PublicKey, SecretKey};
pub use keypair::{ECKeypair, ExportOptions, ImportOptions, MethodType};
pub use proof::{Proof, ProofOptions, ProofPurpose, VerificationResult};
pub use verification::{InMemoryResolver, VerificationMethod, VerificationMethodResolver};
