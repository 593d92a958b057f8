//! # Rahat Core Configuration
//!
//! Layered, validated configuration for the dispatch core.
//!
//! ## Sources (lowest to highest precedence)
//!
//! 1. Built-in defaults (`RahatConfig::default()`)
//! 2. `config/rahat.toml`
//! 3. `config/rahat.{environment}.toml`
//! 4. `RAHAT_*` environment variables, `__` separating nested keys
//!    (`RAHAT_DISPATCH__DEFAULT_TIMEOUT_MS=8000`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rahat_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let timeout = manager.config().dispatch.default_timeout_ms;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{actions, queues, system, timeouts};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring `config/rahat.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RahatConfig {
    /// Peer command routing
    pub dispatch: DispatchConfig,

    /// Meta-transaction queue and worker settings
    pub meta_transactions: MetaTransactionConfig,

    /// Domain event channel
    pub events: EventsConfig,

    /// Project store connection
    pub database: DatabaseConfig,

    pub logging: LoggingConfig,
}

/// What the command sender does with a non-timeout peer failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerFailurePolicy {
    /// Log and hand the caller an explicit `Suppressed` outcome
    #[default]
    Suppress,
    /// Log and return the error
    Propagate,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub default_timeout_ms: u64,

    /// Per-action overrides; these beat handler-declared timeouts
    pub action_timeouts: HashMap<String, u64>,

    /// Actions whose outbound payload carries the acting user
    pub user_required_actions: Vec<String>,

    pub peer_failure_policy: PeerFailurePolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: timeouts::DEFAULT_COMMAND_TIMEOUT_MS,
            action_timeouts: HashMap::new(),
            user_required_actions: vec![
                actions::UPDATE_REDEMPTION.to_string(),
                actions::BENEFICIARY_BULK_ASSIGN_TO_PROJECT.to_string(),
            ],
            peer_failure_policy: PeerFailurePolicy::default(),
        }
    }
}

impl DispatchConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MetaTransactionConfig {
    pub queue_name: String,
    pub job_type: String,

    /// Upper bound on waiting for settlement; `None` waits indefinitely
    pub completion_timeout_ms: Option<u64>,

    pub worker_poll_interval_ms: u64,

    /// How often a Postgres-backed producer checks its job's status row
    pub completion_poll_interval_ms: u64,

    /// A claimed job left unfinished this long is handed to another worker
    pub claim_visibility_timeout_seconds: u64,
}

impl Default for MetaTransactionConfig {
    fn default() -> Self {
        Self {
            queue_name: queues::META_TXN_QUEUE.to_string(),
            job_type: queues::ADD_QUEUE_JOB.to_string(),
            completion_timeout_ms: None,
            worker_poll_interval_ms: 250,
            completion_poll_interval_ms: 500,
            claim_visibility_timeout_seconds: 300,
        }
    }
}

impl MetaTransactionConfig {
    pub fn worker_poll_interval(&self) -> Duration {
        Duration::from_millis(self.worker_poll_interval_ms)
    }

    pub fn completion_poll_interval(&self) -> Duration {
        Duration::from_millis(self.completion_poll_interval_ms)
    }

    pub fn claim_visibility_timeout(&self) -> Duration {
        Duration::from_secs(self.claim_visibility_timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: system::DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/rahat_development".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset; environment default when `None`
    pub level: Option<String>,
    pub json: bool,
}

impl RahatConfig {
    /// Validate configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.dispatch.default_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "dispatch.default_timeout_ms",
                0,
                "timeouts must be greater than zero",
            ));
        }

        if let Some((action, _)) = self
            .dispatch
            .action_timeouts
            .iter()
            .find(|(_, timeout)| **timeout == 0)
        {
            return Err(ConfigurationError::invalid_value(
                format!("dispatch.action_timeouts.{action}"),
                0,
                "timeouts must be greater than zero",
            ));
        }

        if self.meta_transactions.queue_name.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "meta_transactions.queue_name",
                "meta-transaction configuration",
            ));
        }

        if self.meta_transactions.job_type.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "meta_transactions.job_type",
                "meta-transaction configuration",
            ));
        }

        if self.meta_transactions.completion_timeout_ms == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "meta_transactions.completion_timeout_ms",
                0,
                "omit the field to wait indefinitely",
            ));
        }

        if self.meta_transactions.worker_poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "meta_transactions.worker_poll_interval_ms",
                0,
                "poll interval must be greater than zero",
            ));
        }

        if self.meta_transactions.completion_poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "meta_transactions.completion_poll_interval_ms",
                0,
                "poll interval must be greater than zero",
            ));
        }

        if self.meta_transactions.claim_visibility_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "meta_transactions.claim_visibility_timeout_seconds",
                0,
                "visibility timeout must be greater than zero",
            ));
        }

        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                0,
                "channel capacity must be greater than zero",
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                0,
                "pool size must be greater than zero",
            ));
        }

        Ok(())
    }
}
