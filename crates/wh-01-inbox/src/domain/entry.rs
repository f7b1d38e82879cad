use shared_types::Message;

/// A stored message and the logical time it was first stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEntry {
    pub message: Message,
    /// Per-inbox monotonic tick, assigned on first store.
    pub stored_at: u64,
}
