//! Domain layer for the consensus channel
//!
//! - instance: per-instance Paxos acceptor/proposer state
//! - message_state: per-round phase tracking
//! - messages: protocol payloads carried in a message's `data`
//! - quorum: unanimity and majority thresholds

mod config;
mod error;
mod instance;
mod message_state;
mod messages;
pub mod quorum;

pub use config::*;
pub use error::*;
pub use instance::*;
pub use message_state::*;
pub use messages::*;
pub use quorum::QuorumRule;
