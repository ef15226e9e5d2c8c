//! Shared low-level type errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypeError {
    #[error("invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("invalid key length: expected {expected} bytes, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },

    #[error("amount overflow")]
    AmountOverflow,
}
