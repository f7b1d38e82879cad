//! Error types for the consensus channel

use super::Phase;
use crate::ports::HubError;
use shared_types::{MessageError, MessageId, SocketId};

/// JSON-RPC answer code: the socket was not subscribed.
pub const CODE_NOT_SUBSCRIBED: i32 = -2;
/// JSON-RPC answer code: the message is already stored.
pub const CODE_ALREADY_EXISTS: i32 = -3;
/// JSON-RPC answer code: invalid action or data.
pub const CODE_INVALID_DATA: i32 = -4;
/// JSON-RPC answer code: internal server error.
pub const CODE_INTERNAL: i32 = -6;

/// Consensus channel errors
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Failed to verify json schema: {0}")]
    Schema(String),

    #[error("Message already exists: {0}")]
    AlreadyExists(MessageId),

    #[error("Message doesn't correspond to any previously received message: {0}")]
    UnknownMessage(MessageId),

    #[error("Unknown consensus instance: {0}")]
    UnknownInstance(String),

    #[error("Phase not reached: required {required:?}, current {current:?}")]
    PhaseNotReached { required: Phase, current: Phase },

    #[error("Consensus round already failed: {0}")]
    AlreadyFailed(MessageId),

    #[error("Hub error: {0}")]
    Hub(#[from] HubError),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Socket not subscribed: {0}")]
    NotSubscribed(SocketId),

    #[error("A consensus channel shouldn't need to broadcast a message")]
    BroadcastNotSupported,
}

impl ChannelError {
    /// JSON-RPC error code the dispatcher answers with.
    pub fn code(&self) -> i32 {
        match self {
            ChannelError::NotSubscribed(_) => CODE_NOT_SUBSCRIBED,
            ChannelError::AlreadyExists(_) => CODE_ALREADY_EXISTS,
            ChannelError::InvalidMessage(_)
            | ChannelError::Schema(_)
            | ChannelError::UnknownMessage(_)
            | ChannelError::UnknownInstance(_)
            | ChannelError::PhaseNotReached { .. }
            | ChannelError::AlreadyFailed(_)
            | ChannelError::BroadcastNotSupported => CODE_INVALID_DATA,
            ChannelError::Hub(_) | ChannelError::Encoding(_) => CODE_INTERNAL,
        }
    }

    /// Short label used for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            ChannelError::InvalidMessage(_) => "invalid_message",
            ChannelError::Schema(_) => "schema",
            ChannelError::AlreadyExists(_) => "already_exists",
            ChannelError::UnknownMessage(_) => "unknown_message",
            ChannelError::UnknownInstance(_) => "unknown_instance",
            ChannelError::PhaseNotReached { .. } => "phase_not_reached",
            ChannelError::AlreadyFailed(_) => "already_failed",
            ChannelError::Hub(_) => "hub",
            ChannelError::Encoding(_) => "encoding",
            ChannelError::NotSubscribed(_) => "not_subscribed",
            ChannelError::BroadcastNotSupported => "broadcast",
        }
    }
}

impl From<MessageError> for ChannelError {
    fn from(err: MessageError) -> Self {
        ChannelError::InvalidMessage(err.to_string())
    }
}

/// Result type for consensus channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;
