//! Blake2b-256 digests for blocks, transactions, and proof-of-work.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use helix_types::TxId;

type Blake2b256 = Blake2b<U32>;

/// Hash a single byte slice to a 32-byte digest.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a sequence of byte slices as one message.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Digest over a block's serialized header bytes, used to form the
/// non-height portion of its `BlockId`.
pub fn hash_block_digest(header_bytes: &[u8]) -> [u8; 32] {
    blake2b_256(header_bytes)
}

/// Transaction id: digest over the transaction's serialized signing bytes.
pub fn hash_transaction(signing_bytes: &[u8]) -> TxId {
    TxId::new(blake2b_256(signing_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(blake2b_256(b"helix"), blake2b_256(b"helix"));
        assert_ne!(blake2b_256(b"helix"), blake2b_256(b"helios"));
    }

    #[test]
    fn multi_matches_concatenation() {
        let joined = blake2b_256(b"ab cd");
        let parts = blake2b_256_multi(&[b"ab ", b"cd"]);
        assert_eq!(joined, parts);
    }

    #[test]
    fn empty_input_hashes() {
        let d = blake2b_256(b"");
        assert_ne!(d, [0u8; 32]);
    }
}
