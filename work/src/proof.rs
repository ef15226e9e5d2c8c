//! Proof-of-work inputs and work-value computation.

use serde::{Deserialize, Serialize};

use helix_crypto::blake2b_256_multi;
use helix_types::{AccountName, BlockId};

use crate::WorkError;

/// The message a miner grinds over: the chain tip, the miner's identity, and
/// a free nonce. Binding the miner name into the digest prevents proof theft,
/// and binding the previous block id makes stale proofs worthless.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWorkInput {
    pub miner_account: AccountName,
    pub prev_block: BlockId,
    pub nonce: u64,
}

impl ProofOfWorkInput {
    /// The proof's work value: the Blake2b digest of the input folded down
    /// to 128 bits. Smaller is better.
    pub fn work_value(&self) -> u128 {
        let nonce_bytes = self.nonce.to_le_bytes();
        let digest = blake2b_256_multi(&[
            self.miner_account.as_str().as_bytes(),
            self.prev_block.as_bytes(),
            &nonce_bytes,
        ]);
        let mut lo = [0u8; 16];
        lo.copy_from_slice(&digest[..16]);
        u128::from_le_bytes(lo)
    }

    /// A proof beats the target iff its work value is strictly below it.
    pub fn validate(&self, target: u128) -> Result<u128, WorkError> {
        let work = self.work_value();
        if work < target {
            Ok(work)
        } else {
            Err(WorkError::InsufficientWork { work, target })
        }
    }
}
