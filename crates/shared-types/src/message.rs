//! # Message Envelope
//!
//! `{data, sender, signature, message_id, witness_signatures}`, every byte
//! field base64url-encoded. `data` holds the JSON payload a channel decodes.

use crate::encoding;
use crate::{MessageError, MessageId};
use serde::{Deserialize, Serialize};
use shared_crypto::{hash_fields, PublicKey, Signature};

/// A witness co-signature attached to a stored message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessSignature {
    /// Base64url public key of the witness.
    pub witness: String,
    /// Base64url signature of the witness over the message ID.
    pub signature: String,
}

/// Signed, content-addressed message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub data: String,
    pub sender: String,
    pub signature: String,
    pub message_id: MessageId,
    #[serde(default)]
    pub witness_signatures: Vec<WitnessSignature>,
}

impl Message {
    /// Build an envelope around an already-signed payload.
    pub fn new_signed(
        payload: &[u8],
        sender: &PublicKey,
        signature: &Signature,
    ) -> Result<Self, MessageError> {
        let data = encoding::encode(payload);
        let signature = encoding::encode(signature.as_bytes());
        let message_id = Self::compute_id(&data, &signature)?;

        Ok(Self {
            data,
            sender: encoding::encode_key(sender),
            signature,
            message_id,
            witness_signatures: Vec::new(),
        })
    }

    /// `base64url(hash(data, signature))` over the encoded fields.
    pub fn compute_id(data: &str, signature: &str) -> Result<MessageId, MessageError> {
        let hash = hash_fields(&[data, signature])?;
        Ok(encoding::encode(&hash))
    }

    /// Decoded JSON payload.
    pub fn decode_data(&self) -> Result<Vec<u8>, MessageError> {
        encoding::decode("data", &self.data)
    }

    /// Decoded sender key.
    pub fn sender_key(&self) -> Result<PublicKey, MessageError> {
        encoding::decode_key("sender", &self.sender)
    }

    /// Check the message ID and the sender's signature over `data`.
    pub fn verify(&self) -> Result<(), MessageError> {
        let expected = Self::compute_id(&self.data, &self.signature)?;
        if expected != self.message_id {
            return Err(MessageError::MessageIdMismatch {
                expected,
                actual: self.message_id.clone(),
            });
        }

        let payload = self.decode_data()?;
        let sender = self.sender_key()?;
        let signature = Signature::from_slice(&encoding::decode("signature", &self.signature)?)?;

        sender
            .verify(&payload, &signature)
            .map_err(|_| MessageError::InvalidSignature)
    }
}
