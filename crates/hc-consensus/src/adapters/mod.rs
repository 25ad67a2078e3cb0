//! Adapters layer (Hexagonal Architecture)

mod memory_ledger;

pub use memory_ledger::*;
