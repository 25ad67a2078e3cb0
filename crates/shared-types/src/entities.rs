//! # Core Identifiers
//!
//! Newtypes for the 64-bit identifiers that appear in block headers and
//! the fixed-size byte arrays that make up a header.

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

use crate::errors::WireError;

/// A 32-byte digest (SHA-256 or Shabal-256).
pub type Hash = [u8; 32];

/// A 32-byte Ed25519 public key.
pub type PublicKey = [u8; 32];

/// A 64-byte Ed25519 signature.
pub type Signature = [u8; 64];

/// Truncate a digest to a 64-bit identifier.
///
/// Reads bytes `[7, 6, 5, 4, 3, 2, 1, 0]` as a big-endian unsigned number,
/// which is the same as reading the first 8 bytes little-endian.
pub fn id_from_digest(digest: &Hash) -> u64 {
    let mut low = [0u8; 8];
    low.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(low)
}

macro_rules! decimal_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            SerializeDisplay, DeserializeFromStr,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// Raw 64-bit value.
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Big-endian bytes, the order used when the id is hashed.
            pub const fn to_be_bytes(self) -> [u8; 8] {
                self.0.to_be_bytes()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = WireError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<u64>()
                    .map($name)
                    .map_err(|_| WireError::InvalidNumber {
                        field: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value)
            }
        }
    };
}

decimal_id!(
    /// Account identifier derived from a public key.
    AccountId
);

decimal_id!(
    /// Block identifier derived from the full header bytes.
    BlockId
);

decimal_id!(
    /// Transaction identifier. Block transaction lists are ordered by it.
    TransactionId
);

impl AccountId {
    /// Id of the account that owns `digest = SHA256(public_key)`.
    pub fn from_public_key_digest(digest: &Hash) -> Self {
        AccountId(id_from_digest(digest))
    }
}

impl BlockId {
    /// Sentinel used as `previousBlockId` by the genesis block.
    pub const NONE: BlockId = BlockId(0);

    /// Whether this is the genesis sentinel.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Which proof family a block belongs to.
///
/// The two families form independent difficulty tracks inside one chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    /// Proof of stake: balance-weighted hits.
    Stake,
    /// Proof of capacity: precomputed plot scoops.
    Capacity,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Stake => f.write_str("stake"),
            Track::Capacity => f.write_str("capacity"),
        }
    }
}
