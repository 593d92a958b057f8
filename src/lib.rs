#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Rahat Core
//!
//! Project action dispatch and redemption settlement for the Rahat cash and
//! voucher assistance platform.
//!
//! ## Overview
//!
//! Administrative actions against a project arrive as
//! `{subjectId, actionId, payload}`. The dispatcher resolves the action in a
//! registry composed from per-domain handler tables and runs the handler,
//! which either sends a command to a peer microservice under a timeout or
//! settles a blockchain transaction through the meta-transaction queue.
//! Peer responses pass through notification rules that raise domain events.
//!
//! ## Module Organization
//!
//! - [`actions`] - Action requests, handlers, tables and the registry
//! - [`orchestration`] - Dispatcher, command sender, meta-transaction submitter
//! - [`messaging`] - Peer client, command envelopes, transaction queue and worker
//! - [`events`] - Domain events and notification rules
//! - [`projects`] - Project records, persistence and service
//! - [`beneficiaries`] - Beneficiary payload helpers
//! - [`config`] - Layered configuration
//! - [`database`] - Postgres pool and migrations
//! - [`error`] - Crate-level errors
//!
//! ## Quick Start
//!
//! ```rust
//! use rahat_core::actions::ActionRequest;
//! use rahat_core::config::RahatConfig;
//! use rahat_core::orchestration::DispatchSystem;
//! use serde_json::json;
//! use uuid::Uuid;
//!
//! # tokio_test::block_on(async {
//! let (system, peer, _queue) = DispatchSystem::in_memory(&RahatConfig::default()).unwrap();
//! peer.respond_with("PROJECT_SETTINGS_LIST", json!([{"name": "currency"}]));
//!
//! let outcome = system
//!     .dispatcher
//!     .dispatch(ActionRequest::new(Uuid::new_v4(), "SETTINGS.LIST", json!({})))
//!     .await
//!     .unwrap();
//! assert_eq!(outcome.into_value(), Some(json!([{"name": "currency"}])));
//! # });
//! ```

pub mod actions;
pub mod beneficiaries;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod events;
pub mod logging;
pub mod messaging;
pub mod orchestration;
pub mod projects;

pub use actions::{ActingUser, ActionOutcome, ActionRequest};
pub use config::{ConfigManager, RahatConfig};
pub use error::{RahatError, Result};
pub use orchestration::{ActionDispatcher, DispatchSystem, OrchestrationError};
pub use projects::ProjectService;
