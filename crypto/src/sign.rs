//! Ed25519 signing and verification over raw message bytes.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use helix_types::{PrivateKey, PublicKey, Signature};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("malformed public key")]
    MalformedPublicKey,

    #[error("signature verification failed")]
    VerificationFailed,
}

/// Sign a message with an Ed25519 private key.
pub fn sign_message(private: &PrivateKey, message: &[u8]) -> Signature {
    let signing_key = SigningKey::from_bytes(&private.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature over a message against a public key.
pub fn verify_signature(
    public: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignatureError> {
    let verifying_key =
        VerifyingKey::from_bytes(&public.0).map_err(|_| SignatureError::MalformedPublicKey)?;
    let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key
        .verify(message, &sig)
        .map_err(|_| SignatureError::VerificationFailed)
}
