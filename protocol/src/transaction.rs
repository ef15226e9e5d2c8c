//! The signed transaction envelope.
//!
//! A transaction is one operation plus the signatory's key and signature
//! over the operation's canonical bincode encoding. The transaction id is
//! the Blake2b digest of those same signing bytes, so id and signature
//! cover identical content.

use serde::{Deserialize, Serialize};

use helix_crypto::{hash_transaction, sign_message, verify_signature};
use helix_types::{KeyPair, PublicKey, Signature, TxId};

use crate::error::ProtocolError;
use crate::Operation;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub operation: Operation,
    pub signatory: PublicKey,
    pub signature: Signature,
}

impl SignedTransaction {
    /// Sign an operation with the given key pair.
    pub fn sign(operation: Operation, keypair: &KeyPair) -> Self {
        let bytes = signing_bytes(&operation);
        let signature = sign_message(&keypair.private, &bytes);
        Self {
            operation,
            signatory: keypair.public,
            signature,
        }
    }

    /// The transaction id: digest of the operation's signing bytes.
    pub fn id(&self) -> TxId {
        hash_transaction(&signing_bytes(&self.operation))
    }

    /// Check the envelope signature against the declared signatory.
    pub fn verify(&self) -> Result<(), ProtocolError> {
        let bytes = signing_bytes(&self.operation);
        verify_signature(&self.signatory, &bytes, &self.signature)
            .map_err(|_| ProtocolError::InvalidSignature)
    }

    /// Canonical wire encoding, used for raw embedded evidence transactions.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("transaction serialization should not fail")
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        bincode::deserialize(bytes).map_err(|e| ProtocolError::MalformedTransaction(e.to_string()))
    }
}

fn signing_bytes(operation: &Operation) -> Vec<u8> {
    bincode::serialize(operation).expect("operation serialization should not fail")
}
