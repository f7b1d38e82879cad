//! # Socket Collection
//!
//! Set of live connections keyed by socket ID.

use parking_lot::RwLock;
use shared_types::{Socket, SocketId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Outcome of `upsert` or `delete`, with the size read under the same lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    /// Whether the socket was inserted or removed.
    pub changed: bool,
    /// Sockets in the collection right after the change.
    pub len: usize,
}

/// Thread-safe collection of sockets with fan-out.
#[derive(Default)]
pub struct Sockets {
    store: RwLock<HashMap<SocketId, Arc<dyn Socket>>>,
}

impl Sockets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a socket. `changed` is set if it was not present.
    pub fn upsert(&self, socket: Arc<dyn Socket>) -> Membership {
        let id = socket.id().to_string();
        let mut store = self.store.write();
        let changed = store.insert(id, socket).is_none();
        Membership {
            changed,
            len: store.len(),
        }
    }

    /// Remove a socket. `changed` is set if it was present.
    pub fn delete(&self, socket_id: &str) -> Membership {
        let mut store = self.store.write();
        let changed = store.remove(socket_id).is_some();
        Membership {
            changed,
            len: store.len(),
        }
    }

    pub fn contains(&self, socket_id: &str) -> bool {
        self.store.read().contains_key(socket_id)
    }

    /// Number of sockets.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Send a frame to every open socket. Returns how many were attempted.
    ///
    /// The lock is only held while taking a snapshot, so socket writes never
    /// block `upsert` or `delete`.
    pub fn send_to_all(&self, frame: &[u8]) -> usize {
        let snapshot: Vec<Arc<dyn Socket>> = self.store.read().values().cloned().collect();

        let mut sent = 0;
        for socket in snapshot {
            if socket.is_closed() {
                debug!(socket_id = socket.id(), "Skipping closed socket");
                continue;
            }
            socket.send(frame);
            sent += 1;
        }
        sent
    }
}

impl std::fmt::Debug for Sockets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<SocketId> = self.store.read().keys().cloned().collect();
        f.debug_struct("Sockets").field("ids", &ids).finish()
    }
}
