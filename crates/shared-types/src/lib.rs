//! # Shared Types Crate
//!
//! Identifier newtypes and wire helpers shared across the node crates.
//!
//! ## Design Principles
//!
//! - **Unsigned on the wire**: 64-bit ids and amounts travel as decimal
//!   strings so that JSON consumers never lose precision.
//! - **Hex for bytes**: hashes, keys and signatures travel as lowercase hex.
//! - **One truncation rule**: block ids and account ids are both the
//!   little-endian `u64` formed from the first 8 bytes of a SHA-256 digest.

pub mod entities;
pub mod errors;
pub mod wire;

pub use entities::*;
pub use errors::*;
