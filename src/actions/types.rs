//! Request and outcome types flowing through the action dispatcher.

use crate::messaging::TransactionReceipt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identity of the administrator performing an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActingUser {
    pub uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
}

impl ActingUser {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            name: None,
            wallet: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet = Some(wallet.into());
        self
    }
}

/// Inbound administrative action against one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub subject_id: Uuid,
    pub action_id: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acting_user: Option<ActingUser>,
}

impl ActionRequest {
    pub fn new(subject_id: Uuid, action_id: impl Into<String>, payload: Value) -> Self {
        Self {
            subject_id,
            action_id: action_id.into(),
            payload,
            trigger: None,
            acting_user: None,
        }
    }

    pub fn with_trigger(mut self, trigger: Value) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn with_acting_user(mut self, user: ActingUser) -> Self {
        self.acting_user = Some(user);
        self
    }
}

/// What a handler produced
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// Peer response, returned verbatim
    Response(Value),
    /// Settled meta-transaction
    Transaction(TransactionReceipt),
    /// Peer call failed and the failure was contained at the sender
    Suppressed { command: String, reason: String },
}

impl ActionOutcome {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, ActionOutcome::Suppressed { .. })
    }

    pub fn response(&self) -> Option<&Value> {
        match self {
            ActionOutcome::Response(value) => Some(value),
            _ => None,
        }
    }

    pub fn receipt(&self) -> Option<&TransactionReceipt> {
        match self {
            ActionOutcome::Transaction(receipt) => Some(receipt),
            _ => None,
        }
    }

    /// JSON result for the controller layer; a suppressed failure has none
    pub fn into_value(self) -> Option<Value> {
        match self {
            ActionOutcome::Response(value) => Some(value),
            ActionOutcome::Transaction(receipt) => serde_json::to_value(receipt).ok(),
            ActionOutcome::Suppressed { .. } => None,
        }
    }
}
