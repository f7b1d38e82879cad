//! Consensus Channel - pub/sub surface and message dispatch
//!
//! # Publish pipeline
//! 1. Schema check on the decoded data, then envelope verification
//! 2. Reserve the message ID, then the duplicate check against the inbox
//! 3. Decode into `ConsensusData` and run the matching handler
//! 4. Store in the inbox, then release the reservation
//! 5. Fan the original message out to client sockets
//!
//! A handler error stops the pipeline before step 4 and releases the ID.

mod emit;
mod handlers;

use crate::domain::{
    ChannelError, ChannelResult, ConsensusConfig, ConsensusData, ConsensusInstance, MessageState,
};
use crate::metrics;
use crate::ports::{ChannelApi, Hub, SystemTimeSource, TimeSource};
use crate::state::ConsensusState;
use shared_bus::SocketSet;
use shared_crypto::PublicKey;
use shared_types::{Broadcast, Message, Publish, Socket, SocketKind};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wh_01_inbox::{Inbox, InboxMirror};

/// Keeps a message ID claimed while its handler runs.
struct Reservation<'a> {
    state: &'a ConsensusState,
    message_id: &'a str,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.state.release(self.message_id);
    }
}

/// Consensus channel of one LAO on one witness server.
pub struct ConsensusChannel<H: Hub> {
    hub: Arc<H>,
    config: ConsensusConfig,
    inbox: Inbox,
    sockets: SocketSet,
    state: ConsensusState,
    time_source: Box<dyn TimeSource>,
}

impl<H: Hub> ConsensusChannel<H> {
    pub fn new(hub: Arc<H>, config: ConsensusConfig) -> Self {
        let inbox = Inbox::new(config.channel_id.clone());
        Self {
            hub,
            config,
            inbox,
            sockets: SocketSet::new(),
            state: ConsensusState::new(),
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Mirror the inbox to durable storage. Call before any message is stored.
    pub fn with_inbox_mirror(mut self, mirror: Arc<dyn InboxMirror>) -> Self {
        self.inbox = Inbox::with_mirror(self.config.channel_id.clone(), mirror);
        self
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn channel_id(&self) -> &str {
        &self.config.channel_id
    }

    pub fn hub(&self) -> &Arc<H> {
        &self.hub
    }

    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    pub fn sockets(&self) -> &SocketSet {
        &self.sockets
    }

    pub fn state(&self) -> &ConsensusState {
        &self.state
    }

    /// Copy of a Consensus Instance.
    pub fn instance(&self, instance_id: &str) -> Option<ConsensusInstance> {
        self.state.instance_snapshot(instance_id)
    }

    /// Copy of the Message State of the round opened by `elect_id`.
    pub fn round(&self, elect_id: &str) -> Option<MessageState> {
        self.state.round_snapshot(elect_id)
    }

    /// Whether `proposer` is this server, or the organizer hosted here.
    fn is_local_proposer(&self, proposer: &PublicKey) -> bool {
        *proposer == self.hub.pub_key_serv() || self.hub.pub_key_org().as_ref() == Some(proposer)
    }

    /// A server without local clients does not vote.
    fn abstains(&self) -> bool {
        self.config.abstain_without_clients && self.sockets.clients().is_empty()
    }

    /// Schema check and envelope verification. Returns the decoded data.
    fn verify_message(&self, message: &Message) -> ChannelResult<Vec<u8>> {
        let data = message.decode_data()?;
        self.hub
            .schema_validator()
            .verify_data(&data)
            .map_err(ChannelError::Schema)?;
        message.verify()?;
        Ok(data)
    }

    fn dispatch(&self, message: &Message, data: ConsensusData) -> ChannelResult<()> {
        match data {
            ConsensusData::Elect(elect) => self.handle_elect(message, elect),
            ConsensusData::ElectAccept(accept) => self.handle_elect_accept(accept),
            ConsensusData::Prepare(prepare) => self.handle_prepare(prepare),
            ConsensusData::Promise(promise) => self.handle_promise(promise),
            ConsensusData::Propose(propose) => self.handle_propose(propose),
            ConsensusData::Accept(accept) => self.handle_accept(accept),
            ConsensusData::Learn(learn) => self.handle_learn(learn),
            ConsensusData::Failure(failure) => self.handle_failure(failure),
        }
    }

    fn process(&self, query: &Publish) -> ChannelResult<()> {
        if query.params.channel != self.config.channel_id {
            return Err(ChannelError::InvalidMessage(format!(
                "message published on {} routed to {}",
                query.params.channel, self.config.channel_id
            )));
        }

        let message = &query.params.message;
        let data = self.verify_message(message)?;

        if !self.state.reserve(&message.message_id) {
            return Err(ChannelError::AlreadyExists(message.message_id.clone()));
        }
        let _reservation = Reservation {
            state: &self.state,
            message_id: &message.message_id,
        };
        // Checked after reserving: a finished delivery stores before it releases.
        if self.inbox.contains(&message.message_id) {
            return Err(ChannelError::AlreadyExists(message.message_id.clone()));
        }

        let data: ConsensusData = serde_json::from_slice(&data)
            .map_err(|e| ChannelError::InvalidMessage(e.to_string()))?;
        let action = data.action();

        debug!(
            channel = %self.config.channel_id,
            msg_id = %message.message_id,
            action,
            instance_id = %data.instance_id(),
            elect_id = data.elect_id().unwrap_or(""),
            "Processing consensus message"
        );

        self.dispatch(message, data)?;

        if !self.inbox.store_message(message.clone()) {
            return Err(ChannelError::AlreadyExists(message.message_id.clone()));
        }

        let frame = Broadcast::new(self.config.channel_id.clone(), message.clone())
            .to_frame()
            .map_err(|e| ChannelError::Encoding(e.to_string()))?;
        let delivered = self.sockets.clients().send_to_all(&frame);

        debug!(
            channel = %self.config.channel_id,
            msg_id = %message.message_id,
            action,
            clients = delivered,
            "Consensus message stored"
        );
        Ok(())
    }
}

impl<H: Hub> ChannelApi for ConsensusChannel<H> {
    fn subscribe(&self, socket: Arc<dyn Socket>) -> ChannelResult<()> {
        let kind = socket.kind();
        let socket_id = socket.id().to_string();
        let membership = self.sockets.upsert(socket);

        debug!(
            channel = %self.config.channel_id,
            socket_id = %socket_id,
            ?kind,
            inserted = membership.changed,
            "Socket subscribed"
        );

        // Only the insert that took the collection from empty to one.
        if kind == SocketKind::Client && membership.changed && membership.len == 1 {
            if let Err(e) = self.hub.send_subscribe_to_servers(&self.config.channel_id) {
                warn!(
                    channel = %self.config.channel_id,
                    error = %e,
                    "Failed to subscribe to peer servers"
                );
            }
        }
        Ok(())
    }

    fn unsubscribe(&self, socket_id: &str) -> ChannelResult<()> {
        let (kind, remaining) = self
            .sockets
            .delete(socket_id)
            .ok_or_else(|| ChannelError::NotSubscribed(socket_id.to_string()))?;

        debug!(
            channel = %self.config.channel_id,
            socket_id = %socket_id,
            ?kind,
            remaining,
            "Socket unsubscribed"
        );

        if kind == SocketKind::Client && remaining == 0 {
            if let Err(e) = self.hub.send_unsubscribe_to_servers(&self.config.channel_id) {
                warn!(
                    channel = %self.config.channel_id,
                    error = %e,
                    "Failed to unsubscribe from peer servers"
                );
            }
        }
        Ok(())
    }

    fn catchup(&self) -> Vec<Message> {
        self.inbox.get_sorted_messages()
    }

    fn publish(&self, query: &Publish) -> ChannelResult<()> {
        self.process(query).map_err(|e| {
            metrics::record_message_rejected(e.reason());
            info!(
                channel = %self.config.channel_id,
                msg_id = %query.params.message.message_id,
                error = %e,
                "Consensus message rejected"
            );
            e
        })
    }

    fn broadcast(&self, _query: &Broadcast) -> ChannelResult<()> {
        Err(ChannelError::BroadcastNotSupported)
    }
}
