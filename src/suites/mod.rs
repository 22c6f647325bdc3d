/// ECDSA JCS cryptosuite implementation
pub mod ecdsa_jcs;

/// ECDSA RDFC cryptosuite implementation
pub mod ecdsa_rdfc;

/// ECDSA selective-disclosure cryptosuite implementation
pub mod ecdsa_sd;

/// Shared transform/configure/hash/serialize pipeline
pub(crate) mod pipeline;
