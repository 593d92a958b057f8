//! Crate-level error type for the project service surface.

use crate::config::ConfigurationError;
use crate::orchestration::errors::OrchestrationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RahatError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Orchestration(#[from] OrchestrationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

impl RahatError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RahatError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, RahatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestration_errors_keep_their_message() {
        let err: RahatError = OrchestrationError::invalid_action("X").into();
        assert_eq!(err.to_string(), "Please provide a valid action!");
    }

    #[test]
    fn test_not_found() {
        let err = RahatError::not_found("Project", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Project abc not found");
    }
}
