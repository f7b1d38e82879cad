//! # Socket Abstraction
//!
//! A live connection owned by the transport layer. Channels only hold
//! handles and write frames; reading and lifecycle belong to the transport.

/// Which side of the federation a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketKind {
    /// A local application user.
    Client,
    /// A peer witness server.
    Server,
}

/// Connection handle.
pub trait Socket: Send + Sync {
    /// Transport-assigned identifier, unique per live connection.
    fn id(&self) -> &str;

    fn kind(&self) -> SocketKind;

    /// Queue a frame for delivery. Must not block; delivery is best-effort.
    fn send(&self, frame: &[u8]);

    /// Whether the transport has closed this connection.
    fn is_closed(&self) -> bool {
        false
    }
}
