//! # Shared Bus - Socket Fan-Out
//!
//! Every channel keeps two disjoint socket collections: client sockets
//! (local application users) and server sockets (peer witnesses). Messages
//! are fanned out to a whole collection at once.
//!
//! ```text
//!                    ┌──────────────┐
//!   send_to_all() ──→│   Sockets    │──→ socket A ──→ transport
//!                    │  (snapshot)  │──→ socket B ──→ transport
//!                    └──────────────┘──→ socket C ──→ transport
//! ```
//!
//! ## Delivery
//!
//! - **Best-effort:** a slow or closed peer never blocks the others
//! - **No acknowledgment or retry** at this layer; that is the transport's job
//! - **Weak ownership:** sockets are removed when the transport says so

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod socket_set;
pub mod sockets;

// Re-export main types
pub use adapters::{ChannelSocket, RecordingSocket};
pub use socket_set::SocketSet;
pub use sockets::{Membership, Sockets};

/// Default frame buffer per `ChannelSocket` before frames are dropped.
pub const DEFAULT_SOCKET_CAPACITY: usize = 256;
