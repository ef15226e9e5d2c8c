//! Parallel nonce search for miners.
//!
//! The search runs outside the deterministic consensus path; only the
//! accepted proof ever enters block application.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rayon::prelude::*;

use helix_types::{AccountName, BlockId};

use crate::{ProofOfWorkInput, WorkError};

/// Nonces ground per thread between cancellation checks.
const BATCH_SIZE: u64 = 4096;

/// Searches the nonce space across all available CPU cores via rayon.
/// The first thread to beat the target signals the others to stop.
pub struct WorkGenerator {
    cancelled: AtomicBool,
}

impl WorkGenerator {
    pub fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
        }
    }

    /// Stop an in-flight search, e.g. when the chain tip moves and the
    /// proof under construction would go stale.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Find a proof whose work value beats `target`.
    pub fn generate(
        &self,
        miner_account: &AccountName,
        prev_block: BlockId,
        target: u128,
    ) -> Result<ProofOfWorkInput, WorkError> {
        self.cancelled.store(false, Ordering::Relaxed);

        let found = AtomicU64::new(u64::MAX);
        let num_threads = rayon::current_num_threads().max(1);

        (0..num_threads).into_par_iter().for_each(|thread_id| {
            let mut candidate = ProofOfWorkInput {
                miner_account: miner_account.clone(),
                prev_block,
                nonce: thread_id as u64,
            };
            let stride = num_threads as u64;

            loop {
                if found.load(Ordering::Relaxed) != u64::MAX
                    || self.cancelled.load(Ordering::Relaxed)
                {
                    return;
                }

                for _ in 0..BATCH_SIZE {
                    if candidate.work_value() < target {
                        found.store(candidate.nonce, Ordering::Relaxed);
                        return;
                    }
                    candidate.nonce = candidate.nonce.wrapping_add(stride);
                }
            }
        });

        let nonce = found.load(Ordering::Relaxed);
        if nonce == u64::MAX {
            return Err(WorkError::Cancelled);
        }
        Ok(ProofOfWorkInput {
            miner_account: miner_account.clone(),
            prev_block,
            nonce,
        })
    }
}

impl Default for WorkGenerator {
    fn default() -> Self {
        Self::new()
    }
}
