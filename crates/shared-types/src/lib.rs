//! # Shared Types Crate
//!
//! Types shared by the inbox, the socket set and the channels.
//!
//! ## Design Principles
//!
//! - **Content addressing**: A message is identified by the hash of its
//!   base64url `data` and `signature` fields. Two servers given the same pair
//!   always derive the same ID, which makes the ID the deduplication key.
//! - **Opaque envelopes**: Channels decode `data` themselves; the envelope
//!   only knows how to verify that `data` was signed by `sender`.

pub mod encoding;
pub mod errors;
pub mod jsonrpc;
pub mod message;
pub mod socket;

pub use errors::*;
pub use jsonrpc::{Broadcast, MessageParams, Publish};
pub use message::{Message, WitnessSignature};
pub use socket::{Socket, SocketKind};

/// Socket identifiers are opaque strings assigned by the transport.
pub type SocketId = String;

/// Base64url-encoded message identifier.
pub type MessageId = String;
