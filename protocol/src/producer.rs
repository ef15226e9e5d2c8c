//! Producer registration and proof-of-work operations.

use serde::{Deserialize, Serialize};

use helix_types::{AccountName, ChainProperties, PublicKey};
use helix_work::ProofOfWorkInput;

use crate::error::ProtocolError;

/// Register or update a block producer.
///
/// Publishing with `signing_key: None` retires the producer from scheduling
/// without deleting its record. The declared `props` enter the median
/// network-parameter computation while the producer is scheduled.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProducerUpdateOp {
    pub owner: AccountName,
    pub signing_key: Option<PublicKey>,
    pub props: ChainProperties,
    pub url: String,
    /// Declared location in microdegrees. Informational only.
    pub latitude: i64,
    pub longitude: i64,
    pub details: String,
    pub json: String,
}

/// Longest accepted producer URL.
pub const MAX_URL_LENGTH: usize = 256;

/// Longest accepted metadata field.
pub const MAX_METADATA_LENGTH: usize = 4096;

impl ProducerUpdateOp {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.owner.is_valid() {
            return Err(ProtocolError::InvalidAccountName(
                self.owner.as_str().to_string(),
            ));
        }
        if !self.props.is_valid() {
            return Err(ProtocolError::InvalidProperties);
        }
        if self.url.len() > MAX_URL_LENGTH
            || self.details.len() > MAX_METADATA_LENGTH
            || self.json.len() > MAX_METADATA_LENGTH
        {
            return Err(ProtocolError::InvalidProperties);
        }
        if !self.json.is_empty()
            && serde_json::from_str::<serde_json::Value>(&self.json).is_err()
        {
            return Err(ProtocolError::InvalidMetadataJson);
        }
        Ok(())
    }
}

/// Submit an accepted proof-of-work.
///
/// If the miner account does not exist yet, `new_owner_key` funds its
/// creation: the proof both registers the account and credits its first
/// mining power. Existing miners leave it `None`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofOfWorkOp {
    pub work: ProofOfWorkInput,
    pub new_owner_key: Option<PublicKey>,
    pub props: ChainProperties,
}

impl ProofOfWorkOp {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.work.miner_account.is_valid() {
            return Err(ProtocolError::InvalidAccountName(
                self.work.miner_account.as_str().to_string(),
            ));
        }
        if !self.props.is_valid() {
            return Err(ProtocolError::InvalidProperties);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_op() -> ProducerUpdateOp {
        ProducerUpdateOp {
            owner: AccountName::new("alice"),
            signing_key: Some(PublicKey([1; 32])),
            props: ChainProperties::default(),
            url: "https://producer.example".into(),
            latitude: 52_520_000,
            longitude: 13_405_000,
            details: String::new(),
            json: String::new(),
        }
    }

    #[test]
    fn valid_update_passes() {
        assert!(update_op().validate().is_ok());
    }

    #[test]
    fn bad_owner_rejected() {
        let mut op = update_op();
        op.owner = AccountName::new("X");
        assert!(matches!(
            op.validate(),
            Err(ProtocolError::InvalidAccountName(_))
        ));
    }

    #[test]
    fn oversized_url_rejected() {
        let mut op = update_op();
        op.url = "x".repeat(MAX_URL_LENGTH + 1);
        assert!(op.validate().is_err());
    }

    #[test]
    fn malformed_metadata_json_rejected() {
        let mut op = update_op();
        op.json = "{not json".into();
        assert!(matches!(
            op.validate(),
            Err(ProtocolError::InvalidMetadataJson)
        ));

        op.json = r#"{"team": "solo"}"#.into();
        assert!(op.validate().is_ok());
    }

    #[test]
    fn retiring_signing_key_is_valid() {
        let mut op = update_op();
        op.signing_key = None;
        assert!(op.validate().is_ok());
    }
}
