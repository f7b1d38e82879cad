//! In-process witness federation.

use crate::config::{ConfigError, NodeConfig};
use shared_bus::ChannelSocket;
use shared_crypto::{CryptoError, KeyPair};
use shared_types::{Broadcast, Message, MessageError, Publish, SocketKind};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wh_02_consensus::domain::{ConsensusObject, Elect, ElectAccept, ELECT_STARTED};
use wh_02_consensus::{
    ChannelApi, ChannelError, ConsensusChannel, ConsensusConfig, ConsensusData, ElectKey, Hub,
    HubError, StaticHub, SystemTimeSource, TimeSource,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

type Server = Arc<ConsensusChannel<StaticHub>>;

#[derive(Debug, Error)]
pub enum FederationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Hub error: {0}")]
    Hub(#[from] HubError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Round for instance {instance_id} not decided within {timeout_secs}s")]
    Timeout {
        instance_id: String,
        timeout_secs: u64,
    },
}

/// A set of witness servers hosting the same consensus channel, fully
/// connected, with the organizer hosted on server 0.
pub struct Federation {
    config: NodeConfig,
    organizer: KeyPair,
    servers: Vec<Server>,
    client_frames: Vec<Arc<AtomicUsize>>,
    tasks: Vec<JoinHandle<()>>,
    query_ids: AtomicU64,
}

impl Federation {
    /// Build and connect the servers. Must be called inside a tokio runtime.
    pub fn start(config: NodeConfig) -> Result<Self, FederationError> {
        config.validate()?;

        let organizer = KeyPair::generate();
        let servers: Vec<Server> = (0..config.server_count)
            .map(|index| {
                let mut hub = StaticHub::new(KeyPair::generate(), config.server_count);
                if index == 0 {
                    hub = hub.with_org_key(organizer.public_key());
                }
                Arc::new(ConsensusChannel::new(
                    Arc::new(hub),
                    ConsensusConfig::new(config.channel_id.clone()),
                ))
            })
            .collect();

        let mut tasks = Vec::new();

        for (from, server) in servers.iter().enumerate() {
            for (to, peer) in servers.iter().enumerate() {
                if from == to {
                    continue;
                }
                let (socket, receiver) = ChannelSocket::new(
                    format!("server-{from}-to-{to}"),
                    SocketKind::Server,
                    config.socket_capacity,
                );
                server.subscribe(Arc::new(socket))?;
                tasks.push(tokio::spawn(read_connection(peer.clone(), to, receiver)));
            }
        }

        let mut client_frames = Vec::with_capacity(servers.len());
        for (index, server) in servers.iter().enumerate() {
            let counter = Arc::new(AtomicUsize::new(0));
            for client in 0..config.clients_per_server {
                let (socket, receiver) = ChannelSocket::new(
                    format!("client-{index}-{client}"),
                    SocketKind::Client,
                    config.socket_capacity,
                );
                server.subscribe(Arc::new(socket))?;
                tasks.push(tokio::spawn(drain_client(receiver, counter.clone())));
            }
            client_frames.push(counter);
        }

        info!(
            servers = servers.len(),
            channel = %config.channel_id,
            connections = tasks.len(),
            "Witness federation started"
        );

        Ok(Self {
            config,
            organizer,
            servers,
            client_frames,
            tasks,
            query_ids: AtomicU64::new(0),
        })
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    /// Frames delivered to the clients of server `index`.
    pub fn client_frames(&self, index: usize) -> usize {
        self.client_frames
            .get(index)
            .map(|counter| counter.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Open a round on `key`, have every server accept it, and wait until
    /// every server knows the decision. Returns the decision.
    pub async fn run_round(&self, key: ElectKey) -> Result<bool, FederationError> {
        let instance_id = key.instance_id()?;

        let elect = ConsensusData::Elect(Elect {
            object: ConsensusObject::Consensus,
            instance_id: instance_id.clone(),
            created_at: SystemTimeSource.now(),
            key,
            value: ELECT_STARTED.to_string(),
        });
        let payload = serde_json::to_vec(&elect)?;
        let elect = Message::new_signed(
            &payload,
            &self.organizer.public_key(),
            &self.organizer.sign(&payload),
        )?;
        self.publish_everywhere(&elect)?;

        info!(
            instance_id = %instance_id,
            msg_id = %elect.message_id,
            "Elect published"
        );

        for server in &self.servers {
            let hub = server.hub();
            let accept = ConsensusData::ElectAccept(ElectAccept {
                object: ConsensusObject::Consensus,
                instance_id: instance_id.clone(),
                message_id: elect.message_id.clone(),
                accept: true,
            });
            let payload = serde_json::to_vec(&accept)?;
            let signature = hub.sign(&payload)?;
            let message = Message::new_signed(&payload, &hub.pub_key_serv(), &signature)?;
            self.publish_everywhere(&message)?;
        }

        let timeout = self.config.round_timeout();
        tokio::time::timeout(timeout, self.wait_decided(&instance_id))
            .await
            .map_err(|_| FederationError::Timeout {
                instance_id: instance_id.clone(),
                timeout_secs: self.config.round_timeout_secs,
            })
    }

    /// Stop every connection task.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        debug!("Witness federation stopped");
    }

    fn publish_everywhere(&self, message: &Message) -> Result<(), FederationError> {
        for server in &self.servers {
            let id = self.query_ids.fetch_add(1, Ordering::Relaxed);
            let query = Publish::new(id, self.config.channel_id.clone(), message.clone());
            server.publish(&query)?;
        }
        Ok(())
    }

    async fn wait_decided(&self, instance_id: &str) -> bool {
        loop {
            let decisions: Vec<Option<bool>> = self
                .servers
                .iter()
                .map(|server| {
                    server
                        .instance(instance_id)
                        .and_then(|instance| instance.decision)
                })
                .collect();

            if let Some(Some(decision)) = decisions.first() {
                if decisions.iter().all(Option::is_some) {
                    return *decision;
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl Drop for Federation {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Deliver every frame of one connection to the receiving server, in order.
async fn read_connection(peer: Server, peer_index: usize, mut receiver: mpsc::Receiver<Vec<u8>>) {
    let mut query_id = 0u64;
    while let Some(frame) = receiver.recv().await {
        let broadcast = match Broadcast::from_frame(&frame) {
            Ok(broadcast) => broadcast,
            Err(e) => {
                warn!(server = peer_index, error = %e, "Dropping malformed frame");
                continue;
            }
        };

        query_id += 1;
        let query = Publish::new(query_id, broadcast.params.channel, broadcast.params.message);
        if let Err(e) = peer.publish(&query) {
            debug!(
                server = peer_index,
                code = e.code(),
                error = %e,
                "Peer message not applied"
            );
        }
    }
}

async fn drain_client(mut receiver: mpsc::Receiver<Vec<u8>>, frames: Arc<AtomicUsize>) {
    while receiver.recv().await.is_some() {
        frames.fetch_add(1, Ordering::Relaxed);
    }
}
