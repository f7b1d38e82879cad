//! Driving ports (Inbound API)

use crate::domain::ChannelResult;
use shared_types::{Broadcast, Message, Publish, Socket};
use std::sync::Arc;

/// Channel surface exposed to the JSON-RPC dispatcher.
///
/// Calls are synchronous: a message is fully processed before the caller's
/// connection reads the next one.
pub trait ChannelApi: Send + Sync {
    /// Add a client or server socket. Idempotent.
    ///
    /// The first client subscription asks the hub to subscribe this server
    /// to the channel on every peer.
    fn subscribe(&self, socket: Arc<dyn Socket>) -> ChannelResult<()>;

    /// Remove a socket. Removing the last client unsubscribes from peers.
    fn unsubscribe(&self, socket_id: &str) -> ChannelResult<()>;

    /// Every stored message, oldest first.
    fn catchup(&self) -> Vec<Message>;

    /// Verify, process, store and fan out a message.
    fn publish(&self, query: &Publish) -> ChannelResult<()>;

    /// Always rejected: this channel only originates broadcasts.
    fn broadcast(&self, query: &Broadcast) -> ChannelResult<()>;
}
