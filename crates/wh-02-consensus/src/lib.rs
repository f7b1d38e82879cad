//! # wh-02-consensus
//!
//! Consensus channel for a federation of witness servers.
//!
//! ## Architecture
//!
//! Each channel runs single-decree, boolean Synod rounds. A round is opened
//! by an `elect` message and driven by the server credited as its proposer:
//!
//! ```text
//!  elect ──→ elect_accept ×N ──→ prepare ──→ promise ×⌊N/2⌋+1
//!                (unanimity)                    (majority)
//!                                                   │
//!  learn ←── accept ×⌊N/2⌋+1 ←── propose ←──────────┘
//! ```
//!
//! Every accepted message is stored in the channel inbox and fanned out to
//! the channel's client sockets. Follow-up protocol messages are signed with
//! the server key and sent to the peer servers.
//!
//! ### Concurrency
//!
//! Consensus Instances (per instance ID) and Message States (per elect
//! message ID) live in two concurrent maps, each record behind its own lock.
//! A handler locks the Message State first, then the Consensus Instance.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wh_02_consensus::{ChannelApi, ConsensusChannel, ConsensusConfig, StaticHub};
//!
//! let hub = Arc::new(StaticHub::new(KeyPair::generate(), 3));
//! let channel = ConsensusChannel::new(hub, ConsensusConfig::new("/root/lao/consensus"));
//!
//! channel.subscribe(client_socket)?;
//! channel.publish(&query)?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;

// Re-export main types
pub use adapters::{StaticHub, StructuralSchemaValidator};
pub use domain::{
    quorum, AcceptRecord, ChannelError, ChannelResult, ConsensusConfig, ConsensusData,
    ConsensusInstance, ElectKey, MessageState, Phase, PromiseRecord, QuorumRule,
};
pub use ports::{ChannelApi, Hub, HubError, SchemaValidator, SystemTimeSource, TimeSource};
pub use service::ConsensusChannel;
pub use state::ConsensusState;
