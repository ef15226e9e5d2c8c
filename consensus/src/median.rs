//! Component-wise median of scheduled producers' declared chain properties.
//!
//! Each parameter takes the median independently, so a producer cannot move
//! any parameter past what half the scheduled set already declares.

use helix_types::{Amount, ChainProperties};

pub fn median_properties<'a>(
    proposals: impl Iterator<Item = &'a ChainProperties>,
) -> ChainProperties {
    let proposals: Vec<&ChainProperties> = proposals.collect();
    if proposals.is_empty() {
        return ChainProperties::default();
    }

    ChainProperties {
        account_creation_fee: Amount::new(median(
            proposals.iter().map(|p| p.account_creation_fee.raw()),
        )),
        maximum_block_size: median(proposals.iter().map(|p| p.maximum_block_size)),
        pow_target_time_secs: median(proposals.iter().map(|p| p.pow_target_time_secs)),
        pow_decay_time_secs: median(proposals.iter().map(|p| p.pow_decay_time_secs)),
        txn_stake_decay_time_secs: median(proposals.iter().map(|p| p.txn_stake_decay_time_secs)),
        credit_interest_rate: median(proposals.iter().map(|p| p.credit_interest_rate)),
        minimum_transaction_fee: Amount::new(median(
            proposals.iter().map(|p| p.minimum_transaction_fee.raw()),
        )),
        maximum_asset_feed_publishers: median(
            proposals.iter().map(|p| p.maximum_asset_feed_publishers),
        ),
    }
}

fn median<T: Ord + Copy>(values: impl Iterator<Item = T>) -> T {
    let mut values: Vec<T> = values.collect();
    values.sort_unstable();
    values[values.len() / 2]
}
