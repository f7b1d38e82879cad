//! Consensus Instance: the acceptor and proposer variables of one decision.

use super::{AcceptValue, PromiseValue};

/// A promise received for this instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromiseRecord {
    pub accepted_try: i64,
    pub accepted_value: bool,
    pub promised_try: i64,
}

impl From<&PromiseValue> for PromiseRecord {
    fn from(value: &PromiseValue) -> Self {
        Self {
            accepted_try: value.accepted_try,
            accepted_value: value.accepted_value,
            promised_try: value.promised_try,
        }
    }
}

/// An accept received for this instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptRecord {
    pub accepted_try: i64,
    pub accepted_value: bool,
}

impl From<&AcceptValue> for AcceptRecord {
    fn from(value: &AcceptValue) -> Self {
        Self {
            accepted_try: value.accepted_try,
            accepted_value: value.accepted_value,
        }
    }
}

/// State of one single-decree decision, keyed by instance ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusInstance {
    pub instance_id: String,
    pub proposed_try: i64,
    pub promised_try: i64,
    pub accepted_try: i64,
    pub accepted_value: Option<bool>,
    pub proposed_value: Option<bool>,
    pub decided: bool,
    pub decision: Option<bool>,
    pub promises: Vec<PromiseRecord>,
    pub accepts: Vec<AcceptRecord>,
}

impl ConsensusInstance {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            proposed_try: 0,
            promised_try: -1,
            accepted_try: -1,
            accepted_value: None,
            proposed_value: None,
            decided: false,
            decision: None,
            promises: Vec::new(),
            accepts: Vec::new(),
        }
    }

    /// Try number the next prepare should carry: one above both our last
    /// proposal and anything we promised.
    pub fn next_proposed_try(&self) -> i64 {
        if self.proposed_try >= self.promised_try {
            self.proposed_try + 1
        } else {
            self.promised_try + 1
        }
    }

    /// Record a new proposal try. Never decreases.
    pub fn set_proposed_try(&mut self, try_number: i64) {
        self.proposed_try = self.proposed_try.max(try_number);
    }

    /// Highest try any promise reported as accepted, or -1.
    pub fn highest_accepted_try(&self) -> i64 {
        self.promises
            .iter()
            .map(|promise| promise.accepted_try)
            .max()
            .unwrap_or(-1)
    }

    /// Value carried by the accepts with the highest try.
    pub fn quorum_accepted_value(&self) -> Option<bool> {
        self.accepts
            .iter()
            .max_by_key(|accept| accept.accepted_try)
            .map(|accept| accept.accepted_value)
    }

    /// Set the decision. Only the first call has an effect.
    pub fn decide(&mut self, decision: bool) -> bool {
        if self.decided {
            return false;
        }
        self.decided = true;
        self.decision = Some(decision);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_instance() {
        let instance = ConsensusInstance::new("x");
        assert_eq!(instance.proposed_try, 0);
        assert_eq!(instance.promised_try, -1);
        assert_eq!(instance.accepted_try, -1);
        assert!(!instance.decided);
    }

    #[test]
    fn test_next_proposed_try() {
        let mut instance = ConsensusInstance::new("x");
        assert_eq!(instance.next_proposed_try(), 1);

        instance.promised_try = 5;
        assert_eq!(instance.next_proposed_try(), 6);
    }

    #[test]
    fn test_proposed_try_never_decreases() {
        let mut instance = ConsensusInstance::new("x");
        instance.set_proposed_try(4);
        instance.set_proposed_try(2);
        assert_eq!(instance.proposed_try, 4);
    }

    #[test]
    fn test_highest_accepted_try() {
        let mut instance = ConsensusInstance::new("x");
        assert_eq!(instance.highest_accepted_try(), -1);

        instance.promises.push(PromiseRecord {
            accepted_try: -1,
            accepted_value: false,
            promised_try: 1,
        });
        instance.promises.push(PromiseRecord {
            accepted_try: 3,
            accepted_value: true,
            promised_try: 4,
        });
        assert_eq!(instance.highest_accepted_try(), 3);
    }

    #[test]
    fn test_decide_once() {
        let mut instance = ConsensusInstance::new("x");
        assert!(instance.decide(true));
        assert!(!instance.decide(false));
        assert_eq!(instance.decision, Some(true));
    }
}
