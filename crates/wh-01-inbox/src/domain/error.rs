use thiserror::Error;

/// Inbox operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboxError {
    #[error("Message not found in inbox: {0}")]
    NotFound(String),
}

/// Failure reported by a durable mirror.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("Mirror unavailable: {0}")]
    Unavailable(String),
}
