//! Adapters for the production ports

mod empty_source;

pub use empty_source::EmptyTransactionSource;
