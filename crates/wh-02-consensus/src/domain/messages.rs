//! # Protocol Payloads
//!
//! JSON bodies carried base64url-encoded in a message's `data`. Decoded once
//! at the channel boundary into `ConsensusData`, tagged by `action`.

use serde::{Deserialize, Serialize};
use shared_crypto::{hash_fields, CryptoError};
use shared_types::{encoding, MessageId};

/// Value every elect message must carry.
pub const ELECT_STARTED: &str = "started";

/// The `object` field; only `"consensus"` is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusObject {
    #[default]
    #[serde(rename = "consensus")]
    Consensus,
}

/// Decoded consensus payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ConsensusData {
    Elect(Elect),
    ElectAccept(ElectAccept),
    Prepare(Prepare),
    Promise(Promise),
    Propose(Propose),
    Accept(Accept),
    Learn(Learn),
    Failure(Failure),
}

impl ConsensusData {
    pub fn action(&self) -> &'static str {
        match self {
            ConsensusData::Elect(_) => "elect",
            ConsensusData::ElectAccept(_) => "elect_accept",
            ConsensusData::Prepare(_) => "prepare",
            ConsensusData::Promise(_) => "promise",
            ConsensusData::Propose(_) => "propose",
            ConsensusData::Accept(_) => "accept",
            ConsensusData::Learn(_) => "learn",
            ConsensusData::Failure(_) => "failure",
        }
    }

    pub fn instance_id(&self) -> &str {
        match self {
            ConsensusData::Elect(m) => &m.instance_id,
            ConsensusData::ElectAccept(m) => &m.instance_id,
            ConsensusData::Prepare(m) => &m.instance_id,
            ConsensusData::Promise(m) => &m.instance_id,
            ConsensusData::Propose(m) => &m.instance_id,
            ConsensusData::Accept(m) => &m.instance_id,
            ConsensusData::Learn(m) => &m.instance_id,
            ConsensusData::Failure(m) => &m.instance_id,
        }
    }

    /// ID of the elect message this payload refers to (none for elect).
    pub fn elect_id(&self) -> Option<&str> {
        match self {
            ConsensusData::Elect(_) => None,
            ConsensusData::ElectAccept(m) => Some(&m.message_id),
            ConsensusData::Prepare(m) => Some(&m.message_id),
            ConsensusData::Promise(m) => Some(&m.message_id),
            ConsensusData::Propose(m) => Some(&m.message_id),
            ConsensusData::Accept(m) => Some(&m.message_id),
            ConsensusData::Learn(m) => Some(&m.message_id),
            ConsensusData::Failure(m) => Some(&m.message_id),
        }
    }
}

/// What the consensus is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub id: String,
    pub property: String,
}

impl ElectKey {
    pub fn new(
        key_type: impl Into<String>,
        id: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self {
            key_type: key_type.into(),
            id: id.into(),
            property: property.into(),
        }
    }

    /// `base64url(hash("consensus", type, id, property))`
    pub fn instance_id(&self) -> Result<String, CryptoError> {
        let hash = hash_fields(&["consensus", &self.key_type, &self.id, &self.property])?;
        Ok(encoding::encode(&hash))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elect {
    pub object: ConsensusObject,
    pub instance_id: String,
    pub created_at: i64,
    pub key: ElectKey,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectAccept {
    pub object: ConsensusObject,
    pub instance_id: String,
    pub message_id: MessageId,
    pub accept: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareValue {
    pub proposed_try: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prepare {
    pub object: ConsensusObject,
    pub instance_id: String,
    pub message_id: MessageId,
    pub created_at: i64,
    pub value: PrepareValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseValue {
    pub accepted_try: i64,
    /// `false` while nothing was accepted.
    pub accepted_value: bool,
    pub promised_try: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    pub object: ConsensusObject,
    pub instance_id: String,
    pub message_id: MessageId,
    pub created_at: i64,
    pub value: PromiseValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeValue {
    pub proposed_try: i64,
    pub proposed_value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Propose {
    pub object: ConsensusObject,
    pub instance_id: String,
    pub message_id: MessageId,
    pub created_at: i64,
    pub value: ProposeValue,
    #[serde(rename = "acceptor-signatures", default)]
    pub acceptor_signatures: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptValue {
    pub accepted_try: i64,
    pub accepted_value: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accept {
    pub object: ConsensusObject,
    pub instance_id: String,
    pub message_id: MessageId,
    pub created_at: i64,
    pub value: AcceptValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnValue {
    pub decision: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Learn {
    pub object: ConsensusObject,
    pub instance_id: String,
    pub message_id: MessageId,
    pub created_at: i64,
    pub value: LearnValue,
    #[serde(rename = "acceptor-signatures", default)]
    pub acceptor_signatures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub object: ConsensusObject,
    pub instance_id: String,
    pub message_id: MessageId,
    pub created_at: i64,
}
