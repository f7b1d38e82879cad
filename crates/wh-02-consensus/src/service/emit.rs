//! Follow-up messages: sign with the server key, wrap, send to peers.

use super::ConsensusChannel;
use crate::domain::{ChannelError, ChannelResult, ConsensusData};
use crate::ports::Hub;
use shared_types::{Broadcast, Message};
use tracing::debug;

/// A signed follow-up ready to send.
pub(super) struct Outbound {
    pub message: Message,
    pub frame: Vec<u8>,
}

impl<H: Hub> ConsensusChannel<H> {
    pub(super) fn now(&self) -> i64 {
        self.time_source.now()
    }

    /// Encode and sign a payload without touching any state.
    pub(super) fn prepare_outbound(&self, data: &ConsensusData) -> ChannelResult<Outbound> {
        let payload =
            serde_json::to_vec(data).map_err(|e| ChannelError::Encoding(e.to_string()))?;
        let signature = self.hub.sign(&payload)?;
        let message = Message::new_signed(&payload, &self.hub.pub_key_serv(), &signature)
            .map_err(|e| ChannelError::Encoding(e.to_string()))?;
        let frame = Broadcast::new(self.config.channel_id.clone(), message.clone())
            .to_frame()
            .map_err(|e| ChannelError::Encoding(e.to_string()))?;

        Ok(Outbound { message, frame })
    }

    /// Send to every peer server socket.
    pub(super) fn send_to_servers(&self, action: &str, outbound: Outbound) {
        let peers = self.sockets.servers().send_to_all(&outbound.frame);
        debug!(
            channel = %self.config.channel_id,
            msg_id = %outbound.message.message_id,
            action,
            peers,
            "Emitted consensus message"
        );
    }
}
