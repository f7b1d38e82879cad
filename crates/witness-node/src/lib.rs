//! # Witness Node
//!
//! Runs several witness servers in one process. Every pair of servers is
//! connected by a bounded tokio channel per direction, read by its own task,
//! so messages from different peers are processed concurrently while each
//! connection is processed in order.
//!
//! ```text
//!   server 0 ──ChannelSocket──→ reader task ──publish──→ server 1
//!       ↑                                                  │
//!       └──publish── reader task ←──ChannelSocket──────────┘
//! ```

pub mod config;
pub mod federation;

pub use config::{ConfigError, NodeConfig};
pub use federation::{Federation, FederationError};
