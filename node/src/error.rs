use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("consensus error: {0}")]
    Consensus(#[from] helix_consensus::ConsensusError),

    #[error("config error: {0}")]
    Config(String),

    #[error("work error: {0}")]
    Work(#[from] helix_work::WorkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
