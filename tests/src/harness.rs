//! # Test Federation
//!
//! N consensus channels wired together with recording sockets. Nothing is
//! delivered until `deliver` is called, which then pumps frames peer to
//! peer, in FIFO order per link, until every link is empty.

use shared_bus::RecordingSocket;
use shared_crypto::KeyPair;
use shared_types::{Broadcast, Message, Publish, SocketKind};
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use wh_02_consensus::domain::{ConsensusObject, Elect, ElectAccept, Failure, ELECT_STARTED};
use wh_02_consensus::{
    ChannelApi, ChannelError, ChannelResult, ConsensusChannel, ConsensusConfig, ConsensusData,
    ElectKey, Hub, StaticHub,
};

pub const CHANNEL: &str = "/root/lao/consensus";

pub struct Witness {
    pub channel: ConsensusChannel<StaticHub>,
    pub client: Option<Arc<RecordingSocket>>,
    /// Outgoing link to each peer, keyed by the peer's index.
    links: Vec<(usize, Arc<RecordingSocket>)>,
}

/// Messages a `deliver` call moved, and the ones a peer refused.
#[derive(Debug, Default)]
pub struct Delivery {
    pub delivered: usize,
    pub rejected: Vec<(usize, ChannelError)>,
}

pub struct TestFederation {
    pub organizer: KeyPair,
    pub witnesses: Vec<Witness>,
    query_id: Cell<u64>,
    /// `(from, to, message)` for every frame `deliver` moved.
    transcript: RefCell<Vec<(usize, usize, Message)>>,
}

impl TestFederation {
    /// `n` witnesses, each with one client. Witness 0 hosts the organizer.
    pub fn new(n: usize) -> Self {
        Self::with_clients(&vec![true; n])
    }

    /// One witness per entry; `false` leaves that witness without clients.
    pub fn with_clients(clients: &[bool]) -> Self {
        let n = clients.len();
        let organizer = KeyPair::from_seed([0xAA; 32]);

        let mut witnesses: Vec<Witness> = clients
            .iter()
            .enumerate()
            .map(|(index, has_client)| {
                let mut hub = StaticHub::new(KeyPair::from_seed([index as u8 + 1; 32]), n);
                if index == 0 {
                    hub = hub.with_org_key(organizer.public_key());
                }
                let channel = ConsensusChannel::new(Arc::new(hub), ConsensusConfig::new(CHANNEL));
                let client = has_client.then(|| {
                    let socket = Arc::new(RecordingSocket::new(
                        format!("client-{index}"),
                        SocketKind::Client,
                    ));
                    channel
                        .subscribe(socket.clone())
                        .expect("client subscribes");
                    socket
                });
                Witness {
                    channel,
                    client,
                    links: Vec::new(),
                }
            })
            .collect();

        for from in 0..n {
            for to in (0..n).filter(|to| *to != from) {
                let link = Arc::new(RecordingSocket::new(
                    format!("link-{from}-{to}"),
                    SocketKind::Server,
                ));
                witnesses[from]
                    .channel
                    .subscribe(link.clone())
                    .expect("link subscribes");
                witnesses[from].links.push((to, link));
            }
        }

        Self {
            organizer,
            witnesses,
            query_id: Cell::new(0),
            transcript: RefCell::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.witnesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.witnesses.is_empty()
    }

    pub fn channel(&self, index: usize) -> &ConsensusChannel<StaticHub> {
        &self.witnesses[index].channel
    }

    pub fn election_key() -> ElectKey {
        ElectKey::new("election", "e1", "state")
    }

    pub fn instance_id() -> String {
        Self::election_key()
            .instance_id()
            .expect("instance id hashes")
    }

    /// Elect for the default election, signed by the organizer.
    pub fn elect(&self) -> Message {
        self.elect_with(Self::election_key(), Self::instance_id())
    }

    pub fn elect_with(&self, key: ElectKey, instance_id: String) -> Message {
        sign_with(
            &self.organizer,
            &ConsensusData::Elect(Elect {
                object: ConsensusObject::Consensus,
                instance_id,
                created_at: 1_700_000_000,
                key,
                value: ELECT_STARTED.to_string(),
            }),
        )
    }

    /// Elect-accept signed with witness `from`'s server key.
    pub fn elect_accept(&self, from: usize, elect_id: &str, accept: bool) -> Message {
        self.sign_as(
            from,
            &ConsensusData::ElectAccept(ElectAccept {
                object: ConsensusObject::Consensus,
                instance_id: Self::instance_id(),
                message_id: elect_id.to_string(),
                accept,
            }),
        )
    }

    pub fn failure(&self, elect_id: &str, created_at: i64) -> Message {
        sign_with(
            &self.organizer,
            &ConsensusData::Failure(Failure {
                object: ConsensusObject::Consensus,
                instance_id: Self::instance_id(),
                message_id: elect_id.to_string(),
                created_at,
            }),
        )
    }

    pub fn sign_as(&self, index: usize, data: &ConsensusData) -> Message {
        let hub = self.witnesses[index].channel.hub();
        let payload = serde_json::to_vec(data).expect("payload encodes");
        let signature = hub.sign(&payload).expect("witness signs");
        Message::new_signed(&payload, &hub.pub_key_serv(), &signature).expect("message builds")
    }

    pub fn publish_to(&self, index: usize, message: &Message) -> ChannelResult<()> {
        let id = self.query_id.get() + 1;
        self.query_id.set(id);
        self.witnesses[index]
            .channel
            .publish(&Publish::new(id, CHANNEL, message.clone()))
    }

    /// Publish `message` on every witness, in index order.
    pub fn publish_all(&self, message: &Message) -> Vec<ChannelResult<()>> {
        (0..self.len())
            .map(|index| self.publish_to(index, message))
            .collect()
    }

    /// Open the default election and have every witness vote `accept`
    /// (witnesses listed in `rejecting` vote no). Returns the elect message.
    pub fn open_round(&self, rejecting: &[usize]) -> Message {
        let elect = self.elect();
        for result in self.publish_all(&elect) {
            result.expect("elect accepted");
        }
        for from in 0..self.len() {
            let vote = self.elect_accept(from, &elect.message_id, !rejecting.contains(&from));
            for result in self.publish_all(&vote) {
                result.expect("elect_accept accepted");
            }
        }
        elect
    }

    /// Pump every link until the federation is quiet.
    pub fn deliver(&self) -> Delivery {
        let mut delivery = Delivery::default();
        loop {
            let mut moved = 0;
            for (from, witness) in self.witnesses.iter().enumerate() {
                for (to, link) in &witness.links {
                    for frame in link.drain() {
                        moved += 1;
                        let message = Broadcast::from_frame(&frame)
                            .expect("frame parses")
                            .params
                            .message;
                        self.transcript
                            .borrow_mut()
                            .push((from, *to, message.clone()));
                        if let Err(e) = self.publish_to(*to, &message) {
                            delivery.rejected.push((*to, e));
                        }
                    }
                }
            }
            if moved == 0 {
                return delivery;
            }
            delivery.delivered += moved;
        }
    }

    /// Every message `deliver` moved from `from` to `to`, decoded, in order.
    pub fn sent_on_link(&self, from: usize, to: usize) -> Vec<ConsensusData> {
        self.transcript
            .borrow()
            .iter()
            .filter(|(f, t, _)| *f == from && *t == to)
            .map(|(_, _, message)| {
                let payload = message.decode_data().expect("data decodes");
                serde_json::from_slice(&payload).expect("consensus payload")
            })
            .collect()
    }

    pub fn decisions(&self, instance_id: &str) -> Vec<Option<bool>> {
        self.witnesses
            .iter()
            .map(|w| w.channel.instance(instance_id).and_then(|i| i.decision))
            .collect()
    }
}

fn sign_with(signer: &KeyPair, data: &ConsensusData) -> Message {
    let payload = serde_json::to_vec(data).expect("payload encodes");
    Message::new_signed(&payload, &signer.public_key(), &signer.sign(&payload))
        .expect("message builds")
}
