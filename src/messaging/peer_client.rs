//! # Peer Client
//!
//! Abstraction over the message bus used to reach peer microservices
//! (beneficiary service, vendor service, project contract service).
//!
//! The client is shared read-only across every concurrent dispatch. Timeouts
//! are applied by the caller, not by the client.
//!
//! ## Usage
//!
//! ```rust
//! use rahat_core::messaging::{CommandEnvelope, InMemoryPeerClient, PeerClient};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let client = InMemoryPeerClient::new();
//! client.register("PROJECT_SETTINGS_LIST", |_envelope| async move {
//!     Ok(json!([{"name": "CONTRACT_ADDRESS"}]))
//! });
//!
//! let response = client
//!     .send(&CommandEnvelope::new("PROJECT_SETTINGS_LIST"))
//!     .await
//!     .unwrap();
//! assert_eq!(response[0]["name"], "CONTRACT_ADDRESS");
//! # });
//! ```

use super::envelope::CommandEnvelope;
use super::errors::{MessagingError, MessagingResult};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Request/response client for peer microservices
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Send a command and wait for its single correlated response
    async fn send(&self, envelope: &CommandEnvelope) -> MessagingResult<Value>;

    /// Get client type for debugging/observability
    fn client_type(&self) -> &'static str;
}

/// Handler answering one command pattern on the in-memory bus
pub type PeerResponder =
    Arc<dyn Fn(CommandEnvelope) -> BoxFuture<'static, MessagingResult<Value>> + Send + Sync>;

/// In-process message bus: command patterns map to async responders.
///
/// Used to embed peer services in a single process and to stand in for the
/// broker in tests. Every envelope sent is recorded for inspection.
#[derive(Default)]
pub struct InMemoryPeerClient {
    responders: DashMap<String, PeerResponder>,
    sent: Mutex<Vec<CommandEnvelope>>,
}

impl InMemoryPeerClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the responder for a command pattern, replacing any previous one
    pub fn register<F, Fut>(&self, cmd: impl Into<String>, responder: F)
    where
        F: Fn(CommandEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MessagingResult<Value>> + Send + 'static,
    {
        let responder: PeerResponder = Arc::new(move |envelope| responder(envelope).boxed());
        self.responders.insert(cmd.into(), responder);
    }

    /// Register a responder that always answers with the same value
    pub fn respond_with(&self, cmd: impl Into<String>, response: Value) {
        self.register(cmd, move |_| {
            let response = response.clone();
            async move { Ok(response) }
        });
    }

    /// Every envelope sent so far, in send order
    pub fn sent_envelopes(&self) -> Vec<CommandEnvelope> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl PeerClient for InMemoryPeerClient {
    async fn send(&self, envelope: &CommandEnvelope) -> MessagingResult<Value> {
        self.sent.lock().push(envelope.clone());

        // Clone the responder out so no map guard is held across the await
        let responder = self
            .responders
            .get(&envelope.cmd)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| MessagingError::no_responder(&envelope.cmd))?;

        debug!(cmd = %envelope.cmd, subject_id = ?envelope.subject_id, "Delivering in-memory peer command");
        responder(envelope.clone()).await
    }

    fn client_type(&self) -> &'static str {
        "in_memory"
    }
}
