//! Cryptographic primitives for the Helix protocol.
//!
//! - **Ed25519** for block-signing keys and operation signatures
//! - **Blake2b** for block, transaction, and proof-of-work digests

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi, hash_block_digest, hash_transaction};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature, SignatureError};
