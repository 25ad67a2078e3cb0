//! # Shared Crypto - Consensus Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Block ids, account ids, stake hits |
//! | `hashing` | Shabal-256 | Mining plots, capacity proofs |
//! | `signatures` | Ed25519 | Block signatures |
//!
//! ## Verification Modes
//!
//! - **Strict**: rejects small-order keys and non-canonical encodings.
//!   Required for blocks at version 3 and above.
//! - **Legacy**: plain cofactored check, accepted for older blocks.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_many, shabal256, shabal256_many, Hash};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, VerifyMode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
