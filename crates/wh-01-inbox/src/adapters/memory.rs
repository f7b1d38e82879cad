//! In-memory mirror (for testing).

use crate::domain::{InboxEntry, MirrorError};
use crate::ports::InboxMirror;
use parking_lot::Mutex;
use shared_types::WitnessSignature;
use std::sync::atomic::{AtomicBool, Ordering};

/// Records every mirrored write. Can be switched to fail.
#[derive(Debug, Default)]
pub struct InMemoryMirror {
    entries: Mutex<Vec<(String, InboxEntry)>>,
    signatures: Mutex<Vec<(String, String, WitnessSignature)>>,
    failing: AtomicBool,
}

impl InMemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with `MirrorError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// `(channel_id, entry)` pairs written so far.
    pub fn entries(&self) -> Vec<(String, InboxEntry)> {
        self.entries.lock().clone()
    }

    /// `(channel_id, message_id, signature)` triples written so far.
    pub fn signatures(&self) -> Vec<(String, String, WitnessSignature)> {
        self.signatures.lock().clone()
    }

    fn check(&self) -> Result<(), MirrorError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(MirrorError::Unavailable("mirror switched off".to_string()));
        }
        Ok(())
    }
}

impl InboxMirror for InMemoryMirror {
    fn put(&self, channel_id: &str, entry: &InboxEntry) -> Result<(), MirrorError> {
        self.check()?;
        self.entries
            .lock()
            .push((channel_id.to_string(), entry.clone()));
        Ok(())
    }

    fn add_witness_signature(
        &self,
        channel_id: &str,
        message_id: &str,
        signature: &WitnessSignature,
    ) -> Result<(), MirrorError> {
        self.check()?;
        self.signatures.lock().push((
            channel_id.to_string(),
            message_id.to_string(),
            signature.clone(),
        ));
        Ok(())
    }
}
