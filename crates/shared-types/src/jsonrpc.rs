//! # JSON-RPC Frames
//!
//! The two message-carrying queries a channel deals with directly:
//! `publish` (inbound from the dispatcher) and `broadcast` (outbound to
//! sockets). Subscription management queries are decoded by the dispatcher.

use crate::{Message, MessageError};
use serde::{Deserialize, Serialize};

/// JSON-RPC protocol version.
pub const JSONRPC_VERSION: &str = "2.0";

/// Method name of a publish query.
pub const METHOD_PUBLISH: &str = "publish";

/// Method name of a broadcast query.
pub const METHOD_BROADCAST: &str = "broadcast";

/// `params` of a message-carrying query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageParams {
    pub channel: String,
    pub message: Message,
}

/// `publish` query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publish {
    pub jsonrpc: String,
    pub method: String,
    pub id: u64,
    pub params: MessageParams,
}

impl Publish {
    pub fn new(id: u64, channel: impl Into<String>, message: Message) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: METHOD_PUBLISH.to_string(),
            id,
            params: MessageParams {
                channel: channel.into(),
                message,
            },
        }
    }
}

/// `broadcast` query. Carries no `id`: it expects no answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    pub jsonrpc: String,
    pub method: String,
    pub params: MessageParams,
}

impl Broadcast {
    pub fn new(channel: impl Into<String>, message: Message) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: METHOD_BROADCAST.to_string(),
            params: MessageParams {
                channel: channel.into(),
                message,
            },
        }
    }

    /// Serialize to the bytes written on a socket.
    pub fn to_frame(&self) -> Result<Vec<u8>, MessageError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a frame read from a socket.
    pub fn from_frame(frame: &[u8]) -> Result<Self, MessageError> {
        let broadcast: Self = serde_json::from_slice(frame)?;
        if broadcast.method != METHOD_BROADCAST {
            return Err(MessageError::InvalidJson(format!(
                "expected method `{METHOD_BROADCAST}`, got `{}`",
                broadcast.method
            )));
        }
        Ok(broadcast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> Message {
        Message {
            data: "e30=".to_string(),
            sender: "c2VuZGVy".to_string(),
            signature: "c2ln".to_string(),
            message_id: "aWQ=".to_string(),
            witness_signatures: Vec::new(),
        }
    }

    #[test]
    fn test_broadcast_frame_shape() {
        let frame = Broadcast::new("/root/lao/consensus", sample_message())
            .to_frame()
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "broadcast");
        assert!(value.get("id").is_none());
        assert_eq!(value["params"]["channel"], "/root/lao/consensus");
        assert_eq!(value["params"]["message"]["message_id"], "aWQ=");
    }

    #[test]
    fn test_from_frame_rejects_other_methods() {
        let publish = Publish::new(7, "/root/lao/consensus", sample_message());
        let frame = serde_json::to_vec(&publish).unwrap();

        assert!(Broadcast::from_frame(&frame).is_err());
    }
}
