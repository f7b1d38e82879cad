//! Inbox domain types.

mod entry;
mod error;

pub use entry::InboxEntry;
pub use error::{InboxError, MirrorError};
