//! Block and transaction identifiers.
//!
//! A block id embeds the block height in its first eight bytes, so the
//! height of a referenced block can be recovered from the id alone. This is
//! relied upon by the commit-violation evaluator, which must derive the
//! height of conflicting commitments without fetching the blocks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte block identifier: 8 bytes of big-endian height followed by the
/// first 24 bytes of the block digest.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId([u8; 32]);

impl BlockId {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Build a block id from a height and a 32-byte digest. The digest's
    /// first 24 bytes are kept; the height displaces the rest.
    pub fn new(height: u64, digest: [u8; 32]) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&height.to_be_bytes());
        bytes[8..].copy_from_slice(&digest[..24]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The block height encoded in this id.
    pub fn block_num(&self) -> u64 {
        let mut height = [0u8; 8];
        height.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(height)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({}:{})", self.block_num(), hex::encode(&self.0[8..12]))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// A 32-byte transaction identifier.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId([u8; 32]);

impl TxId {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}
