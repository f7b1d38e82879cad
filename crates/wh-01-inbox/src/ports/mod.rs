//! # Outbound Ports
//!
//! Dependencies the inbox may be given by the host application.

use crate::domain::{InboxEntry, MirrorError};
use shared_types::WitnessSignature;

/// Durable copy of an inbox.
///
/// The in-memory inbox stays authoritative: a mirror failure is logged and
/// never fails the store.
///
/// Testing: `InMemoryMirror`
pub trait InboxMirror: Send + Sync {
    /// Persist a newly stored entry.
    fn put(&self, channel_id: &str, entry: &InboxEntry) -> Result<(), MirrorError>;

    /// Persist a witness signature added to an existing entry.
    fn add_witness_signature(
        &self,
        channel_id: &str,
        message_id: &str,
        signature: &WitnessSignature,
    ) -> Result<(), MirrorError>;
}
