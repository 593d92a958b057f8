//! # Command Sender
//!
//! Outbound RPC to peer microservices with a per-call timeout and the
//! notification side-effect hook.
//!
//! ## Failure semantics
//!
//! - A call that outlives its timeout fails with
//!   [`OrchestrationError::PeerTimeout`]; only the local wait is abandoned.
//! - Any other peer failure is logged. Under [`PeerFailurePolicy::Suppress`]
//!   the caller receives [`ActionOutcome::Suppressed`]; under
//!   [`PeerFailurePolicy::Propagate`] it receives
//!   [`OrchestrationError::PeerError`].
//! - Notification rules run on the delivered response before it is returned.

use crate::actions::types::{ActingUser, ActionOutcome};
use crate::config::{DispatchConfig, PeerFailurePolicy};
use crate::constants::fields;
use crate::events::NotificationEmitter;
use crate::messaging::{CommandEnvelope, PeerClient};
use crate::orchestration::errors::{OrchestrationError, OrchestrationResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Sends peer commands on behalf of action handlers
pub struct CommandSender {
    peer: Arc<dyn PeerClient>,
    emitter: Arc<NotificationEmitter>,
    default_timeout_ms: u64,
    action_timeouts: HashMap<String, u64>,
    user_required_actions: HashSet<String>,
    failure_policy: PeerFailurePolicy,
}

impl CommandSender {
    pub fn new(
        peer: Arc<dyn PeerClient>,
        emitter: Arc<NotificationEmitter>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            peer,
            emitter,
            default_timeout_ms: config.default_timeout_ms,
            action_timeouts: config
                .action_timeouts
                .iter()
                .map(|(action_id, timeout_ms)| (action_id.to_uppercase(), *timeout_ms))
                .collect(),
            user_required_actions: config
                .user_required_actions
                .iter()
                .map(|action_id| action_id.to_uppercase())
                .collect(),
            failure_policy: config.peer_failure_policy,
        }
    }

    /// Pre-bind the sender to one dispatch
    pub fn bind(
        self: &Arc<Self>,
        action_id: impl Into<String>,
        acting_user: Option<ActingUser>,
    ) -> BoundSender {
        BoundSender {
            sender: Arc::clone(self),
            action_id: action_id.into(),
            acting_user,
        }
    }

    /// Configured override > handler-declared timeout > global default
    pub fn resolve_timeout(&self, action_id: &str, declared_timeout_ms: Option<u64>) -> u64 {
        // Config sources may fold key case; action identifiers are upper case
        self.action_timeouts
            .get(&action_id.to_uppercase())
            .copied()
            .or(declared_timeout_ms)
            .unwrap_or(self.default_timeout_ms)
    }

    pub fn requires_acting_user(&self, action_id: &str) -> bool {
        self.user_required_actions
            .contains(&action_id.to_uppercase())
    }

    pub fn failure_policy(&self) -> PeerFailurePolicy {
        self.failure_policy
    }

    /// Send one command and wait for its response
    pub async fn send(
        &self,
        mut envelope: CommandEnvelope,
        declared_timeout_ms: Option<u64>,
        action_id: &str,
        acting_user: Option<&ActingUser>,
    ) -> OrchestrationResult<ActionOutcome> {
        let timeout_ms = self.resolve_timeout(action_id, declared_timeout_ms);

        if self.requires_acting_user(action_id) {
            if let Some(user) = acting_user {
                let user_value = serde_json::to_value(user)
                    .map_err(|e| OrchestrationError::peer_error(&envelope.cmd, e.to_string()))?;
                if !envelope.merge_field(fields::USER, user_value) {
                    warn!(
                        action_id = action_id,
                        cmd = %envelope.cmd,
                        "Payload cannot carry the acting user; sending without it"
                    );
                }
            }
        }

        debug!(
            action_id = action_id,
            cmd = %envelope.cmd,
            subject_id = ?envelope.subject_id,
            timeout_ms = timeout_ms,
            client = self.peer.client_type(),
            "Sending peer command"
        );

        let started = Instant::now();
        let result =
            tokio::time::timeout(Duration::from_millis(timeout_ms), self.peer.send(&envelope))
                .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Err(_) => {
                warn!(
                    action_id = action_id,
                    cmd = %envelope.cmd,
                    timeout_ms = timeout_ms,
                    "Peer command timed out"
                );
                Err(OrchestrationError::peer_timeout(&envelope.cmd, timeout_ms))
            }
            Ok(Ok(response)) => {
                debug!(cmd = %envelope.cmd, elapsed_ms = elapsed_ms, "Peer command answered");
                self.emitter.on_response(&response, &envelope);
                Ok(ActionOutcome::Response(response))
            }
            Ok(Err(e)) if e.is_timeout() => {
                warn!(cmd = %envelope.cmd, error = %e, "Peer transport reported a timeout");
                Err(e.into())
            }
            Ok(Err(e)) => {
                error!(
                    action_id = action_id,
                    cmd = %envelope.cmd,
                    error = %e,
                    elapsed_ms = elapsed_ms,
                    policy = ?self.failure_policy,
                    "Peer command failed"
                );
                match self.failure_policy {
                    PeerFailurePolicy::Suppress => Ok(ActionOutcome::Suppressed {
                        command: envelope.cmd,
                        reason: e.to_string(),
                    }),
                    PeerFailurePolicy::Propagate => {
                        Err(OrchestrationError::peer_error(envelope.cmd, e.to_string()))
                    }
                }
            }
        }
    }
}

/// A [`CommandSender`] bound to one dispatch's action and acting user
#[derive(Clone)]
pub struct BoundSender {
    sender: Arc<CommandSender>,
    action_id: String,
    acting_user: Option<ActingUser>,
}

impl BoundSender {
    /// Send with the handler's declared timeout (`None` for the default)
    pub async fn send(
        &self,
        envelope: CommandEnvelope,
        timeout_ms: Option<u64>,
    ) -> OrchestrationResult<ActionOutcome> {
        self.sender
            .send(
                envelope,
                timeout_ms,
                &self.action_id,
                self.acting_user.as_ref(),
            )
            .await
    }

    pub fn action_id(&self) -> &str {
        &self.action_id
    }

    pub fn acting_user(&self) -> Option<&ActingUser> {
        self.acting_user.as_ref()
    }
}
