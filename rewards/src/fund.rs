//! The four reward pools.

use serde::{Deserialize, Serialize};

use helix_types::Amount;

/// Pool balances drained by the distributions in [`crate::distribute`].
/// Refilled externally each period by the token-supply module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardFund {
    /// Paid in full to each accepted proof of work.
    pub work_reward_balance: Amount,
    /// Split hourly across producers by recent transaction-stake weight.
    pub txn_stake_reward_balance: Amount,
    /// Split per newly-irreversible block across its staked commitments.
    pub validation_reward_balance: Amount,
    /// Paid whole to the producer with the most accumulated activity stake.
    pub producer_activity_reward_balance: Amount,
}

impl RewardFund {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> Amount {
        self.work_reward_balance
            .saturating_add(self.txn_stake_reward_balance)
            .saturating_add(self.validation_reward_balance)
            .saturating_add(self.producer_activity_reward_balance)
    }
}
