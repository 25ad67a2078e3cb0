//! # Digests
//!
//! SHA-256 for identities and stake proofs, Shabal-256 for plots and
//! capacity proofs. Both produce 32 bytes.

use sha2::{Digest, Sha256};
use shabal::Shabal256;

/// 256-bit digest output.
pub type Hash = [u8; 32];

/// SHA-256 of a single input.
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// SHA-256 over the concatenation of several inputs.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}

/// Shabal-256 of a single input.
pub fn shabal256(data: &[u8]) -> Hash {
    Shabal256::digest(data).into()
}

/// Shabal-256 over the concatenation of several inputs.
pub fn shabal256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Shabal256::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize().into()
}
