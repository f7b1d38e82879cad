//! Ports for the consensus channel
//!
//! - inbound: the pub/sub surface the dispatcher drives
//! - outbound: the hub, schema validation and time

mod inbound;
mod outbound;

pub use inbound::*;
pub use outbound::*;
