//! Per-round state, keyed by the ID of the elect message that opened the round.

use shared_crypto::PublicKey;

/// Round phases, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    ElectAccept,
    Promise,
    Propose,
    Accept,
    Learn,
    Finished,
}

/// Progress of one proposal round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageState {
    pub phase: Phase,
    /// Sender of the elect message, credited with driving the round.
    pub proposer: PublicKey,
    pub elect_accept_count: usize,
    pub elect_reject_count: usize,
    /// One-shot abort marker.
    pub failed: bool,
}

impl MessageState {
    pub fn new(proposer: PublicKey) -> Self {
        Self {
            phase: Phase::ElectAccept,
            proposer,
            elect_accept_count: 0,
            elect_reject_count: 0,
            failed: false,
        }
    }

    /// Move to `phase` unless already past it. Returns whether it moved.
    pub fn advance_to(&mut self, phase: Phase) -> bool {
        if phase > self.phase {
            self.phase = phase;
            true
        } else {
            false
        }
    }
}
