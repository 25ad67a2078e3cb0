//! # Wire Helpers
//!
//! Hex encoding for fixed-size byte arrays, usable directly or through
//! `#[serde(with = "...")]`.

use crate::errors::WireError;

/// Decode a hex string into exactly `N` bytes.
pub fn decode_fixed<const N: usize>(field: &'static str, text: &str) -> Result<[u8; N], WireError> {
    let bytes = hex::decode(text).map_err(|_| WireError::InvalidHex { field })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| WireError::InvalidLength {
        field,
        expected: N,
        actual,
    })
}

/// Serde adapter for `[u8; 32]` as hex.
pub mod hex32 {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as lowercase hex.
    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// Deserialize from hex, rejecting any length other than 32 bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        super::decode_fixed::<32>("bytes32", &text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `[u8; 64]` as hex.
pub mod hex64 {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as lowercase hex.
    pub fn serialize<S: Serializer>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// Deserialize from hex, rejecting any length other than 64 bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 64], D::Error> {
        let text = String::deserialize(deserializer)?;
        super::decode_fixed::<64>("bytes64", &text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `Option<[u8; 32]>` as optional hex.
pub mod option_hex32 {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize `Some` as hex and `None` as null.
    pub fn serialize<S: Serializer>(
        bytes: &Option<[u8; 32]>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize optional hex.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<[u8; 32]>, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        text.map(|t| super::decode_fixed::<32>("bytes32", &t))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
