//! # Action Handlers
//!
//! Handlers are stateless dispatch glue between an [`ActionRequest`] and
//! either a peer command or the meta-transaction queue. They receive a
//! [`BoundSender`] already scoped to the live peer client, the resolved
//! action and the acting user.

use super::types::{ActionOutcome, ActionRequest};
use crate::constants::fields;
use crate::events::{EventPublisher, ProjectEvent};
use crate::messaging::CommandEnvelope;
use crate::orchestration::command_sender::BoundSender;
use crate::orchestration::errors::OrchestrationResult;
use crate::orchestration::meta_transaction::MetaTransactionSubmitter;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// How a handler routes its work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    PeerCommand,
    MetaTransaction,
    Custom,
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(
        &self,
        request: &ActionRequest,
        sender: &BoundSender,
    ) -> OrchestrationResult<ActionOutcome>;

    fn kind(&self) -> HandlerKind;
}

/// Where the project identifier goes in an outbound peer command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Empty payload; project carried on the envelope
    SubjectOnly,
    /// Request payload as-is; project carried on the envelope
    Passthrough,
    /// `{dto: payload, projectUid}`
    WrappedDto,
    /// `{projectId, ...payload}`
    ProjectScoped,
}

impl PayloadShape {
    pub fn build(&self, cmd: &str, subject_id: Uuid, payload: &Value) -> CommandEnvelope {
        match self {
            PayloadShape::SubjectOnly => CommandEnvelope::new(cmd).with_subject(subject_id),
            PayloadShape::Passthrough => CommandEnvelope::new(cmd)
                .with_subject(subject_id)
                .with_payload(payload.clone()),
            PayloadShape::WrappedDto => CommandEnvelope::new(cmd).with_payload(json!({
                fields::DTO: payload,
                fields::PROJECT_UID: subject_id,
            })),
            PayloadShape::ProjectScoped => {
                let mut scoped = Map::new();
                scoped.insert(fields::PROJECT_ID.to_string(), json!(subject_id));
                if let Value::Object(extra) = payload {
                    for (key, value) in extra {
                        scoped.insert(key.clone(), value.clone());
                    }
                }
                CommandEnvelope::new(cmd).with_payload(Value::Object(scoped))
            }
        }
    }
}

/// Forwards the action to a peer service as one command
#[derive(Debug, Clone)]
pub struct PeerCommandAction {
    pub command: &'static str,
    pub shape: PayloadShape,
    pub timeout_ms: Option<u64>,
}

impl PeerCommandAction {
    pub fn new(command: &'static str, shape: PayloadShape) -> Self {
        Self {
            command,
            shape,
            timeout_ms: None,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

#[async_trait]
impl ActionHandler for PeerCommandAction {
    async fn handle(
        &self,
        request: &ActionRequest,
        sender: &BoundSender,
    ) -> OrchestrationResult<ActionOutcome> {
        let envelope = self
            .shape
            .build(self.command, request.subject_id, &request.payload);
        sender.send(envelope, self.timeout_ms).await
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::PeerCommand
    }
}

/// Settles the action through the meta-transaction queue
pub struct MetaTransactionAction {
    submitter: Arc<MetaTransactionSubmitter>,
    settlement_event: Option<(ProjectEvent, EventPublisher)>,
}

impl MetaTransactionAction {
    pub fn new(submitter: Arc<MetaTransactionSubmitter>) -> Self {
        Self {
            submitter,
            settlement_event: None,
        }
    }

    /// Publish `event` once the transaction settles
    pub fn announce_settlement(mut self, event: ProjectEvent, publisher: EventPublisher) -> Self {
        self.settlement_event = Some((event, publisher));
        self
    }
}

#[async_trait]
impl ActionHandler for MetaTransactionAction {
    async fn handle(
        &self,
        request: &ActionRequest,
        _sender: &BoundSender,
    ) -> OrchestrationResult<ActionOutcome> {
        let receipt = self
            .submitter
            .submit(
                request.payload.clone(),
                request.subject_id,
                request.trigger.clone(),
            )
            .await?;

        if let Some((event, publisher)) = &self.settlement_event {
            debug!(event = %event, action_id = %request.action_id, "Announcing settled meta-transaction");
            publisher.publish(
                *event,
                json!({
                    fields::SUBJECT_ID: request.subject_id,
                    "transactionHash": receipt.transaction_hash,
                    "status": receipt.status,
                }),
            );
        }

        Ok(ActionOutcome::Transaction(receipt))
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::MetaTransaction
    }
}

type ActionFn = Arc<
    dyn Fn(ActionRequest, BoundSender) -> BoxFuture<'static, OrchestrationResult<ActionOutcome>>
        + Send
        + Sync,
>;

/// Closure-backed handler for ad-hoc tables
#[derive(Clone)]
pub struct FnAction {
    f: ActionFn,
}

#[async_trait]
impl ActionHandler for FnAction {
    async fn handle(
        &self,
        request: &ActionRequest,
        sender: &BoundSender,
    ) -> OrchestrationResult<ActionOutcome> {
        (self.f)(request.clone(), sender.clone()).await
    }

    fn kind(&self) -> HandlerKind {
        HandlerKind::Custom
    }
}

/// Wrap an async closure as an [`ActionHandler`]
pub fn action_fn<F, Fut>(f: F) -> FnAction
where
    F: Fn(ActionRequest, BoundSender) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = OrchestrationResult<ActionOutcome>> + Send + 'static,
{
    FnAction {
        f: Arc::new(move |request, sender| f(request, sender).boxed()),
    }
}
