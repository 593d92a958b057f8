//! # Orchestration Error Types
//!
//! Errors surfaced by the action dispatcher and its collaborators:
//! - Dispatch errors (unknown action)
//! - Peer command errors (timeout, failure under strict policy)
//! - Settlement errors (queue unavailable, failed or unsettled transaction)
//! - Registry composition errors

use crate::constants::INVALID_ACTION_MESSAGE;
use crate::messaging::MessagingError;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while composing action tables into a registry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Action {action_id} registered by both {first_table} and {second_table}")]
    DuplicateAction {
        action_id: String,
        first_table: String,
        second_table: String,
    },

    #[error("Table {table} registers an empty action identifier")]
    EmptyActionId { table: String },

    #[error("Table {table} is registered more than once")]
    DuplicateTable { table: String },
}

/// Errors a dispatch can end in
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrchestrationError {
    #[error("{}", INVALID_ACTION_MESSAGE)]
    InvalidAction { action_id: String },

    #[error("Peer command {command} timed out after {timeout_ms}ms")]
    PeerTimeout { command: String, timeout_ms: u64 },

    #[error("Peer command {command} failed: {message}")]
    PeerError { command: String, message: String },

    #[error("Transaction queue {queue_name} unavailable: {message}")]
    QueueUnavailable { queue_name: String, message: String },

    #[error("Meta-transaction {job_id} failed: {message}")]
    TransactionFailed { job_id: Uuid, message: String },

    #[error("Meta-transaction {job_id} did not settle within {timeout_ms}ms")]
    SettlementTimeout { job_id: Uuid, timeout_ms: u64 },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Messaging error: {0}")]
    Messaging(MessagingError),
}

impl OrchestrationError {
    pub fn invalid_action(action_id: impl Into<String>) -> Self {
        Self::InvalidAction {
            action_id: action_id.into(),
        }
    }

    pub fn peer_timeout(command: impl Into<String>, timeout_ms: u64) -> Self {
        Self::PeerTimeout {
            command: command.into(),
            timeout_ms,
        }
    }

    pub fn peer_error(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PeerError {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Map queue-side failures onto the settlement taxonomy
impl From<MessagingError> for OrchestrationError {
    fn from(error: MessagingError) -> Self {
        match error {
            MessagingError::PeerTimeout {
                command,
                timeout_ms,
            } => Self::PeerTimeout {
                command,
                timeout_ms,
            },
            MessagingError::QueueUnavailable {
                queue_name,
                message,
            } => Self::QueueUnavailable {
                queue_name,
                message,
            },
            MessagingError::JobFailed { job_id, message } => {
                Self::TransactionFailed { job_id, message }
            }
            MessagingError::JobAbandoned { job_id } => Self::TransactionFailed {
                job_id,
                message: "job abandoned by the queue".to_string(),
            },
            MessagingError::CompletionTimeout { job_id, timeout_ms } => {
                Self::SettlementTimeout { job_id, timeout_ms }
            }
            other => Self::Messaging(other),
        }
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
