//! # Action Dispatcher
//!
//! Resolves an inbound [`ActionRequest`] against the composed registry, binds
//! a sender for the live peer client and runs the handler. The handler's
//! outcome is returned verbatim; the dispatcher keeps no state between calls.

use crate::actions::registry::ActionRegistry;
use crate::actions::types::{ActionOutcome, ActionRequest};
use crate::logging::{log_dispatch_operation, log_error};
use crate::orchestration::command_sender::CommandSender;
use crate::orchestration::errors::{OrchestrationError, OrchestrationResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{instrument, warn};

pub struct ActionDispatcher {
    registry: Arc<ActionRegistry>,
    sender: Arc<CommandSender>,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<ActionRegistry>, sender: Arc<CommandSender>) -> Self {
        Self { registry, sender }
    }

    /// Route one action to its handler
    #[instrument(
        skip(self, request),
        fields(action_id = %request.action_id, subject_id = %request.subject_id)
    )]
    pub async fn dispatch(&self, request: ActionRequest) -> OrchestrationResult<ActionOutcome> {
        let Some(handler) = self.registry.resolve(&request.action_id) else {
            warn!("Rejected unknown action");
            return Err(OrchestrationError::invalid_action(&request.action_id));
        };

        let started = Instant::now();
        let bound = self
            .sender
            .bind(&request.action_id, request.acting_user.clone());
        let result = handler.handle(&request, &bound).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(ActionOutcome::Suppressed { command, reason }) => log_dispatch_operation(
                &request.action_id,
                request.subject_id,
                "suppressed",
                duration_ms,
                Some(&format!("{command}: {reason}")),
            ),
            Ok(_) => log_dispatch_operation(
                &request.action_id,
                request.subject_id,
                "success",
                duration_ms,
                None,
            ),
            Err(e) => log_error(
                "dispatcher",
                &request.action_id,
                &e.to_string(),
                Some(&request.subject_id.to_string()),
            ),
        }

        result
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn sender(&self) -> &Arc<CommandSender> {
        &self.sender
    }
}
