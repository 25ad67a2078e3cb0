//! Domain layer for the consensus engine
//!
//! Pure logic: block shapes, the binary and wire codecs, plots, proofs,
//! difficulty and the canonical chain. No I/O and no locking.

mod block;
mod chain;
pub mod codec;
mod difficulty;
mod error;
mod plot;
pub mod proof;

pub use block::*;
pub use chain::*;
pub use difficulty::*;
pub use error::*;
pub use plot::*;
