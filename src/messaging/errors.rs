//! # Messaging Error Types
//!
//! Transport-level errors for the peer message bus and the meta-transaction
//! queue, using thiserror for structured error types instead of
//! `Box<dyn Error>` patterns.

use thiserror::Error;
use uuid::Uuid;

/// Errors raised by peer clients and transaction queues
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessagingError {
    #[error("Peer request timed out: {command} after {timeout_ms}ms")]
    PeerTimeout { command: String, timeout_ms: u64 },

    #[error("Peer request failed: {command}: {message}")]
    PeerFailure { command: String, message: String },

    #[error("No peer handles command: {command}")]
    NoResponder { command: String },

    #[error("Queue unavailable: {queue_name}: {message}")]
    QueueUnavailable { queue_name: String, message: String },

    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    QueueOperation {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Job not found: {job_id}")]
    JobNotFound { job_id: Uuid },

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: Uuid, message: String },

    #[error("Job {job_id} was abandoned before reaching a terminal state")]
    JobAbandoned { job_id: Uuid },

    #[error("Job {job_id} did not settle within {timeout_ms}ms")]
    CompletionTimeout { job_id: Uuid, timeout_ms: u64 },

    #[error("Message serialization error: {message}")]
    MessageSerialization { message: String },

    #[error("Message deserialization error: {message}")]
    MessageDeserialization { message: String },

    #[error("Internal messaging error: {message}")]
    Internal { message: String },
}

impl MessagingError {
    pub fn peer_timeout(command: impl Into<String>, timeout_ms: u64) -> Self {
        Self::PeerTimeout {
            command: command.into(),
            timeout_ms,
        }
    }

    pub fn peer_failure(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PeerFailure {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn no_responder(command: impl Into<String>) -> Self {
        Self::NoResponder {
            command: command.into(),
        }
    }

    pub fn queue_unavailable(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueueUnavailable {
            queue_name: queue_name.into(),
            message: message.into(),
        }
    }

    pub fn queue_operation(
        queue_name: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_name: queue_name.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn job_failed(job_id: Uuid, message: impl Into<String>) -> Self {
        Self::JobFailed {
            job_id,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error means the peer did not answer in time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::PeerTimeout { .. })
    }
}

/// Conversion from serde_json::Error to MessagingError
impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            MessagingError::MessageDeserialization {
                message: err.to_string(),
            }
        } else {
            MessagingError::MessageSerialization {
                message: err.to_string(),
            }
        }
    }
}

/// Result type alias for messaging operations
pub type MessagingResult<T> = Result<T, MessagingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messaging_error_creation() {
        let timeout_err = MessagingError::peer_timeout("PROJECT_SETTINGS_LIST", 5000);
        assert!(timeout_err.is_timeout());

        let queue_err = MessagingError::queue_unavailable("META_TXN", "closed");
        assert!(matches!(queue_err, MessagingError::QueueUnavailable { .. }));
        assert!(!queue_err.is_timeout());
    }

    #[test]
    fn test_error_conversions() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid json").unwrap_err();
        let messaging_err: MessagingError = json_err.into();
        assert!(matches!(
            messaging_err,
            MessagingError::MessageDeserialization { .. }
        ));
    }

    #[test]
    fn test_error_display() {
        let err = MessagingError::peer_failure("VENDOR_LIST_BY_PROJECT", "connection reset");
        let display_str = format!("{err}");
        assert!(display_str.contains("Peer request failed"));
        assert!(display_str.contains("VENDOR_LIST_BY_PROJECT"));
        assert!(display_str.contains("connection reset"));
    }
}
