use crate::domain::{ConsensusInstance, MessageState};
use dashmap::{DashMap, DashSet};
use parking_lot::{Mutex, RwLock};
use shared_crypto::PublicKey;
use shared_types::MessageId;
use std::sync::Arc;

/// Encapsulates the mutable state of a consensus channel.
///
/// Consensus Instances are keyed by instance ID, Message States by the ID of
/// the elect message that opened the round. Records are handed out as `Arc`s
/// so map shards are never locked while a record lock is held.
///
/// `in_flight` holds the IDs of messages whose handler is running, so one
/// envelope is never dispatched twice at the same time.
#[derive(Default)]
pub struct ConsensusState {
    instances: DashMap<String, Arc<RwLock<ConsensusInstance>>>,
    rounds: DashMap<MessageId, Arc<Mutex<MessageState>>>,
    in_flight: DashSet<MessageId>,
}

impl ConsensusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the instance if absent. Returns whether it was created.
    pub fn open_instance(&self, instance_id: &str) -> bool {
        let mut created = false;
        self.instances
            .entry(instance_id.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(RwLock::new(ConsensusInstance::new(instance_id)))
            });
        created
    }

    /// Create the Message State of a round if absent. Returns whether it was created.
    pub fn open_round(&self, elect_id: &str, proposer: PublicKey) -> bool {
        let mut created = false;
        self.rounds.entry(elect_id.to_string()).or_insert_with(|| {
            created = true;
            Arc::new(Mutex::new(MessageState::new(proposer)))
        });
        created
    }

    /// Claim a message ID for processing. `false` if it is already claimed.
    pub fn reserve(&self, message_id: &str) -> bool {
        self.in_flight.insert(message_id.to_string())
    }

    pub fn release(&self, message_id: &str) {
        self.in_flight.remove(message_id);
    }

    pub fn is_reserved(&self, message_id: &str) -> bool {
        self.in_flight.contains(message_id)
    }

    pub fn instance(&self, instance_id: &str) -> Option<Arc<RwLock<ConsensusInstance>>> {
        self.instances.get(instance_id).map(|entry| entry.value().clone())
    }

    pub fn round(&self, elect_id: &str) -> Option<Arc<Mutex<MessageState>>> {
        self.rounds.get(elect_id).map(|entry| entry.value().clone())
    }

    /// Copy of an instance, for inspection.
    pub fn instance_snapshot(&self, instance_id: &str) -> Option<ConsensusInstance> {
        self.instance(instance_id).map(|instance| instance.read().clone())
    }

    /// Copy of a Message State, for inspection.
    pub fn round_snapshot(&self, elect_id: &str) -> Option<MessageState> {
        self.round(elect_id).map(|round| round.lock().clone())
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }
}
