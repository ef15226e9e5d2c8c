use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("work value {work:#034x} does not beat target {target:#034x}")]
    InsufficientWork { work: u128, target: u128 },

    #[error("work search cancelled before a qualifying nonce was found")]
    Cancelled,
}
