//! # Error Types
//!
//! Errors raised while decoding or verifying a message envelope.

use shared_crypto::CryptoError;
use thiserror::Error;

/// Errors related to envelope decoding and verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// A field is not valid base64url.
    #[error("Invalid base64 in field `{field}`")]
    InvalidBase64 { field: &'static str },

    /// The payload or frame is not valid JSON for the expected shape.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The message ID does not match `hash(data, signature)`.
    #[error("Message ID mismatch: expected {expected}, got {actual}")]
    MessageIdMismatch { expected: String, actual: String },

    /// The sender is not a valid public key.
    #[error("Invalid sender public key")]
    InvalidSender,

    /// The signature does not verify against the sender and data.
    #[error("Invalid message signature")]
    InvalidSignature,

    /// Lower-level cryptographic failure.
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<serde_json::Error> for MessageError {
    fn from(err: serde_json::Error) -> Self {
        MessageError::InvalidJson(err.to_string())
    }
}
