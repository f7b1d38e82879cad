//! In-process hub around a server key pair.

use crate::adapters::StructuralSchemaValidator;
use crate::ports::{Hub, HubError, SchemaValidator};
use shared_crypto::{KeyPair, PublicKey, Signature};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Hub with a fixed federation size and no outbound connections.
///
/// Subscribe/unsubscribe requests to peers are counted so a runtime or a
/// test can observe them.
pub struct StaticHub {
    keypair: KeyPair,
    org_key: Option<PublicKey>,
    server_count: usize,
    validator: Arc<dyn SchemaValidator>,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
}

impl StaticHub {
    pub fn new(keypair: KeyPair, server_count: usize) -> Self {
        Self {
            keypair,
            org_key: None,
            server_count,
            validator: Arc::new(StructuralSchemaValidator),
            subscribe_calls: AtomicUsize::new(0),
            unsubscribe_calls: AtomicUsize::new(0),
        }
    }

    /// Host the organizer key on this server.
    pub fn with_org_key(mut self, org_key: PublicKey) -> Self {
        self.org_key = Some(org_key);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }
}

impl Hub for StaticHub {
    fn pub_key_org(&self) -> Option<PublicKey> {
        self.org_key
    }

    fn pub_key_serv(&self) -> PublicKey {
        self.keypair.public_key()
    }

    fn sign(&self, data: &[u8]) -> Result<Signature, HubError> {
        Ok(self.keypair.sign(data))
    }

    fn server_count(&self) -> usize {
        self.server_count
    }

    fn send_subscribe_to_servers(&self, channel_id: &str) -> Result<(), HubError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        debug!(channel = %channel_id, "Subscribing to peer servers");
        Ok(())
    }

    fn send_unsubscribe_to_servers(&self, channel_id: &str) -> Result<(), HubError> {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        debug!(channel = %channel_id, "Unsubscribing from peer servers");
        Ok(())
    }

    fn schema_validator(&self) -> Arc<dyn SchemaValidator> {
        self.validator.clone()
    }
}

impl std::fmt::Debug for StaticHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticHub")
            .field("server", &self.keypair.public_key())
            .field("org_key", &self.org_key)
            .field("server_count", &self.server_count)
            .finish()
    }
}
