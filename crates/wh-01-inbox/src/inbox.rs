//! # Inbox
//!
//! One `RwLock` guards the map and the logical clock together, so the tick
//! order always matches the order entries became visible.

use crate::domain::{InboxEntry, InboxError};
use crate::ports::InboxMirror;
use parking_lot::RwLock;
use shared_types::{Message, MessageId, WitnessSignature};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
struct Entries {
    by_id: HashMap<MessageId, InboxEntry>,
    clock: u64,
}

/// Deduplicated, insertion-ordered message store of one channel.
pub struct Inbox {
    channel_id: String,
    entries: RwLock<Entries>,
    mirror: Option<Arc<dyn InboxMirror>>,
}

impl Inbox {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            entries: RwLock::new(Entries::default()),
            mirror: None,
        }
    }

    /// Inbox whose new entries are also written to `mirror`.
    pub fn with_mirror(channel_id: impl Into<String>, mirror: Arc<dyn InboxMirror>) -> Self {
        Self {
            mirror: Some(mirror),
            ..Self::new(channel_id)
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Store a message under its ID.
    ///
    /// Returns `false` if the ID was already stored; the existing entry and
    /// its position are left untouched.
    pub fn store_message(&self, message: Message) -> bool {
        let entry = {
            let mut entries = self.entries.write();
            if entries.by_id.contains_key(&message.message_id) {
                debug!(
                    channel = %self.channel_id,
                    msg_id = %message.message_id,
                    "Message already stored"
                );
                return false;
            }
            entries.clock += 1;
            let entry = InboxEntry {
                message,
                stored_at: entries.clock,
            };
            entries
                .by_id
                .insert(entry.message.message_id.clone(), entry.clone());
            entry
        };

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.put(&self.channel_id, &entry) {
                warn!(
                    channel = %self.channel_id,
                    msg_id = %entry.message.message_id,
                    error = %e,
                    "Failed to mirror inbox entry"
                );
            }
        }
        true
    }

    pub fn get_message(&self, message_id: &str) -> Option<Message> {
        self.entries
            .read()
            .by_id
            .get(message_id)
            .map(|entry| entry.message.clone())
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.entries.read().by_id.contains_key(message_id)
    }

    /// All messages, ascending by first store time.
    pub fn get_sorted_messages(&self) -> Vec<Message> {
        let mut entries: Vec<InboxEntry> = self.entries.read().by_id.values().cloned().collect();
        entries.sort_by_key(|entry| entry.stored_at);
        entries.into_iter().map(|entry| entry.message).collect()
    }

    /// Attach a witness co-signature to a stored message.
    pub fn add_witness_signature(
        &self,
        message_id: &str,
        witness: impl Into<String>,
        signature: impl Into<String>,
    ) -> Result<(), InboxError> {
        let witness_signature = WitnessSignature {
            witness: witness.into(),
            signature: signature.into(),
        };

        {
            let mut entries = self.entries.write();
            let entry = entries
                .by_id
                .get_mut(message_id)
                .ok_or_else(|| InboxError::NotFound(message_id.to_string()))?;
            entry
                .message
                .witness_signatures
                .push(witness_signature.clone());
        }

        if let Some(mirror) = &self.mirror {
            if let Err(e) =
                mirror.add_witness_signature(&self.channel_id, message_id, &witness_signature)
            {
                warn!(
                    channel = %self.channel_id,
                    msg_id = %message_id,
                    error = %e,
                    "Failed to mirror witness signature"
                );
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Inbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inbox")
            .field("channel_id", &self.channel_id)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryMirror;
    use shared_crypto::KeyPair;

    fn signed(payload: &str) -> Message {
        let keypair = KeyPair::from_seed([7u8; 32]);
        let signature = keypair.sign(payload.as_bytes());
        Message::new_signed(payload.as_bytes(), &keypair.public_key(), &signature).unwrap()
    }

    #[test]
    fn test_store_and_get() {
        let inbox = Inbox::new("/root/lao/consensus");
        let message = signed(r#"{"n":1}"#);

        assert!(inbox.store_message(message.clone()));
        assert_eq!(inbox.get_message(&message.message_id), Some(message));
        assert!(inbox.get_message("missing").is_none());
    }

    #[test]
    fn test_restore_is_noop() {
        let inbox = Inbox::new("c");
        let first = signed(r#"{"n":1}"#);
        let second = signed(r#"{"n":2}"#);

        assert!(inbox.store_message(first.clone()));
        assert!(inbox.store_message(second.clone()));
        assert!(!inbox.store_message(first.clone()));

        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox.get_sorted_messages(), vec![first, second]);
    }

    #[test]
    fn test_catchup_preserves_store_order() {
        let inbox = Inbox::new("c");
        let messages: Vec<Message> = (0..20).map(|n| signed(&format!(r#"{{"n":{n}}}"#))).collect();
        for message in &messages {
            inbox.store_message(message.clone());
        }

        assert_eq!(inbox.get_sorted_messages(), messages);
    }

    #[test]
    fn test_add_witness_signature() {
        let inbox = Inbox::new("c");
        let message = signed(r#"{"n":1}"#);
        inbox.store_message(message.clone());

        inbox
            .add_witness_signature(&message.message_id, "witness", "sig")
            .unwrap();

        let stored = inbox.get_message(&message.message_id).unwrap();
        assert_eq!(stored.witness_signatures.len(), 1);
        assert_eq!(stored.witness_signatures[0].witness, "witness");
    }

    #[test]
    fn test_add_witness_signature_unknown_id() {
        let inbox = Inbox::new("c");

        let result = inbox.add_witness_signature("nope", "w", "s");
        assert_eq!(result, Err(InboxError::NotFound("nope".to_string())));
    }

    #[test]
    fn test_mirror_receives_new_entries_only() {
        let mirror = Arc::new(InMemoryMirror::new());
        let inbox = Inbox::with_mirror("c", mirror.clone());
        let message = signed(r#"{"n":1}"#);

        inbox.store_message(message.clone());
        inbox.store_message(message.clone());
        inbox
            .add_witness_signature(&message.message_id, "w", "s")
            .unwrap();

        let entries = mirror.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "c");
        assert_eq!(entries[0].1.stored_at, 1);
        assert_eq!(mirror.signatures().len(), 1);
    }

    #[test]
    fn test_mirror_failure_does_not_fail_store() {
        let mirror = Arc::new(InMemoryMirror::new());
        mirror.set_failing(true);
        let inbox = Inbox::with_mirror("c", mirror.clone());
        let message = signed(r#"{"n":1}"#);

        assert!(inbox.store_message(message.clone()));
        assert!(inbox.contains(&message.message_id));
        assert!(mirror.entries().is_empty());
    }
}
