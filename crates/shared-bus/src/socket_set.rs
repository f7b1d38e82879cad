//! # Socket Set
//!
//! The two disjoint collections a channel owns.

use crate::{Membership, Sockets};
use shared_types::{Socket, SocketKind};
use std::sync::Arc;

/// Client and server sockets of one channel.
#[derive(Debug, Default)]
pub struct SocketSet {
    clients: Sockets,
    servers: Sockets,
}

impl SocketSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clients(&self) -> &Sockets {
        &self.clients
    }

    pub fn servers(&self) -> &Sockets {
        &self.servers
    }

    /// Insert into the collection matching `socket.kind()`.
    pub fn upsert(&self, socket: Arc<dyn Socket>) -> Membership {
        match socket.kind() {
            SocketKind::Client => self.clients.upsert(socket),
            SocketKind::Server => self.servers.upsert(socket),
        }
    }

    /// Remove from whichever collection holds the socket. Returns its kind
    /// and how many sockets of that kind remain.
    pub fn delete(&self, socket_id: &str) -> Option<(SocketKind, usize)> {
        let clients = self.clients.delete(socket_id);
        if clients.changed {
            return Some((SocketKind::Client, clients.len));
        }
        let servers = self.servers.delete(socket_id);
        servers
            .changed
            .then_some((SocketKind::Server, servers.len))
    }
}
