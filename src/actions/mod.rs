//! # Actions
//!
//! Inbound administrative actions, the handlers that serve them and the
//! registry that maps action identifiers onto handlers.

pub mod handler;
pub mod registry;
pub mod tables;
pub mod types;

pub use handler::{
    action_fn, ActionHandler, FnAction, HandlerKind, MetaTransactionAction, PayloadShape,
    PeerCommandAction,
};
pub use registry::{ActionRegistry, ActionRegistryBuilder, ActionTable, RegistryStats};
pub use tables::default_registry;
pub use types::{ActingUser, ActionOutcome, ActionRequest};
