//! # Quorum Policy
//!
//! Elect-accepts need every server (unanimity); promises and accepts need a
//! strict majority.

/// `n`: every server must answer.
pub fn unanimity(n: usize) -> usize {
    n
}

/// `⌊n/2⌋ + 1`
pub fn majority(n: usize) -> usize {
    n / 2 + 1
}

/// Threshold rule applied to a count of responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuorumRule {
    Unanimity,
    Majority,
}

impl QuorumRule {
    pub fn threshold(self, n: usize) -> usize {
        match self {
            QuorumRule::Unanimity => unanimity(n),
            QuorumRule::Majority => majority(n),
        }
    }

    pub fn is_reached(self, count: usize, n: usize) -> bool {
        count >= self.threshold(n)
    }
}
