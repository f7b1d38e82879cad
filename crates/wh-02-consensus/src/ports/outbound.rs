//! Driven ports (Outbound SPI)

use shared_crypto::{PublicKey, Signature};
use std::sync::Arc;

/// Hub failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Peer servers unreachable: {0}")]
    Unreachable(String),
}

/// The server hosting this channel.
///
/// The server secret key never leaves the hub; channels ask it to sign.
pub trait Hub: Send + Sync {
    /// Organizer key, when the organizer is hosted on this server.
    fn pub_key_org(&self) -> Option<PublicKey>;

    /// This server's public key.
    fn pub_key_serv(&self) -> PublicKey;

    /// Sign with the server key.
    fn sign(&self, data: &[u8]) -> Result<Signature, HubError>;

    /// Witness servers in the federation, this one included.
    fn server_count(&self) -> usize;

    /// Subscribe this server to `channel_id` on every peer.
    fn send_subscribe_to_servers(&self, channel_id: &str) -> Result<(), HubError>;

    /// Unsubscribe this server from `channel_id` on every peer.
    fn send_unsubscribe_to_servers(&self, channel_id: &str) -> Result<(), HubError>;

    fn schema_validator(&self) -> Arc<dyn SchemaValidator>;
}

/// Well-formedness check for decoded message data.
pub trait SchemaValidator: Send + Sync {
    fn verify_data(&self, data: &[u8]) -> Result<(), String>;
}

/// Time source for `created_at` (allows mocking in tests)
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in seconds
    fn now(&self) -> i64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default()
    }
}
