//! # Inbox (wh-01)
//!
//! Every channel keeps the messages it accepted in an inbox. A message is
//! stored once under its ID; a client joining late replays the inbox in the
//! order messages were first stored.
//!
//! ## Domain Invariants
//!
//! | Invariant | Description |
//! |-----------|-------------|
//! | Append-only | Entries are never removed |
//! | Deduplicated | At most one entry per message ID |
//! | Stable order | Re-storing a known ID keeps its original position |
//!
//! ## Crate Structure
//!
//! - `domain/` - Entries and errors
//! - `ports/` - The optional durable mirror SPI
//! - `adapters/` - In-memory mirror
//! - `inbox.rs` - The inbox itself

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod inbox;
pub mod ports;

pub use adapters::InMemoryMirror;
pub use domain::{InboxEntry, InboxError, MirrorError};
pub use inbox::Inbox;
pub use ports::InboxMirror;
