//! # Consensus Metrics
//!
//! Prometheus metrics for consensus channels.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! wh-02-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `consensus_rounds_opened_total` - Counter of rounds opened by elect messages
//! - `consensus_decisions_total` - Counter of decisions reached (by value)
//! - `consensus_messages_rejected_total` - Counter of rejected messages (by reason)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total rounds opened
    pub static ref ROUNDS_OPENED: IntCounter = register_int_counter!(
        "consensus_rounds_opened_total",
        "Total number of consensus rounds opened"
    )
    .expect("Failed to create ROUNDS_OPENED metric");

    /// Total decisions, labeled by decided value
    pub static ref DECISIONS: IntCounterVec = register_int_counter_vec!(
        "consensus_decisions_total",
        "Total number of consensus decisions reached",
        &["decision"]
    )
    .expect("Failed to create DECISIONS metric");

    /// Total messages rejected, labeled by rejection reason
    pub static ref MESSAGES_REJECTED: IntCounterVec = register_int_counter_vec!(
        "consensus_messages_rejected_total",
        "Total number of consensus messages rejected",
        &["reason"]
    )
    .expect("Failed to create MESSAGES_REJECTED metric");
}

/// Record a round opened by an elect message
#[cfg(feature = "metrics")]
pub fn record_round_opened() {
    ROUNDS_OPENED.inc();
}

/// Record a decision
#[cfg(feature = "metrics")]
pub fn record_decision(decision: bool) {
    let label = if decision { "true" } else { "false" };
    DECISIONS.with_label_values(&[label]).inc();
}

/// Record a rejected message with reason
#[cfg(feature = "metrics")]
pub fn record_message_rejected(reason: &str) {
    MESSAGES_REJECTED.with_label_values(&[reason]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_round_opened() {}

#[cfg(not(feature = "metrics"))]
pub fn record_decision(_decision: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn record_message_rejected(_reason: &str) {}
