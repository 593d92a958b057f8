//! # Orchestration
//!
//! The dispatch core for project actions.
//!
//! ## Core Components
//!
//! - **ActionDispatcher**: resolves an action to its handler and runs it
//! - **CommandSender**: peer RPC with timeouts and the notification hook
//! - **MetaTransactionSubmitter**: enqueues on-chain work and awaits settlement
//! - **DispatchSystem**: wires the above from configuration

pub mod bootstrap;
pub mod command_sender;
pub mod dispatcher;
pub mod errors;
pub mod meta_transaction;

pub use bootstrap::DispatchSystem;
pub use command_sender::{BoundSender, CommandSender};
pub use dispatcher::ActionDispatcher;
pub use errors::{OrchestrationError, OrchestrationResult, RegistryError};
pub use meta_transaction::MetaTransactionSubmitter;
