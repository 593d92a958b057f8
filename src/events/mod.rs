pub mod publisher;
pub mod rules;
pub mod types;

// Re-export key types for convenience
pub use publisher::EventPublisher;
pub use rules::{default_rules, NotificationEmitter, NotificationRule};
pub use types::{DomainEvent, ProjectEvent};
