//! Domain event names and the published event record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Project-level domain events consumed by notification listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectEvent {
    ProjectCreated,
    BeneficiaryAddedToProject,
    RequestRedemption,
    UpdateRedemption,
    RedeemVoucher,
}

impl ProjectEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectEvent::ProjectCreated => "PROJECT_CREATED",
            ProjectEvent::BeneficiaryAddedToProject => "BENEFICIARY_ADDED_TO_PROJECT",
            ProjectEvent::RequestRedemption => "REQUEST_REDEMPTION",
            ProjectEvent::UpdateRedemption => "UPDATE_REDEMPTION",
            ProjectEvent::RedeemVoucher => "REDEEM_VOUCHER",
        }
    }
}

impl fmt::Display for ProjectEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event that has been published
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainEvent {
    pub name: ProjectEvent,
    pub payload: Value,
    pub published_at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(name: ProjectEvent, payload: Value) -> Self {
        Self {
            name,
            payload,
            published_at: Utc::now(),
        }
    }
}
