//! # Error Types
//!
//! Errors raised while decoding wire representations.

use thiserror::Error;

/// A wire field could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Field is not valid hex.
    #[error("Invalid hex in field {field}")]
    InvalidHex {
        /// Field name.
        field: &'static str,
    },

    /// Field decoded to the wrong number of bytes.
    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Field name.
        field: &'static str,
        /// Required byte length.
        expected: usize,
        /// Decoded byte length.
        actual: usize,
    },

    /// Field is not an unsigned decimal number.
    #[error("Invalid number in field {field}: {value}")]
    InvalidNumber {
        /// Field name.
        field: &'static str,
        /// Offending text.
        value: String,
    },
}
