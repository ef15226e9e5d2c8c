use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid account name: {0}")]
    InvalidAccountName(String),

    #[error("signature does not match the declared signatory")]
    InvalidSignature,

    #[error("malformed transaction bytes: {0}")]
    MalformedTransaction(String),

    #[error("commitment stake must be at least one token unit")]
    InsufficientStake,

    #[error("commit references no verification transactions")]
    EmptyVerificationSet,

    #[error("violation evidence transactions are identical")]
    IdenticalEvidence,

    #[error("declared chain properties are out of range")]
    InvalidProperties,

    #[error("producer metadata is not valid JSON")]
    InvalidMetadataJson,

    #[error("block id must reference a concrete block")]
    ZeroBlockId,
}
