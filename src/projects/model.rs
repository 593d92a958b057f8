use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_PROJECT_STATUS: &str = "NOT_READY";

/// Project represents one aid programme
/// Maps to `projects` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub uuid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub contract_address: Option<String>,
    pub extras: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New Project for creation (without generated fields)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub project_type: String,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub extras: Option<Value>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, project_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            status: None,
            project_type: project_type.into(),
            contract_address: None,
            extras: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_extras(mut self, extras: Value) -> Self {
        self.extras = Some(extras);
        self
    }

    /// Materialize with generated fields filled in
    pub fn into_project(self, uuid: Uuid, now: DateTime<Utc>) -> Project {
        Project {
            uuid,
            name: self.name,
            description: self.description,
            status: self
                .status
                .unwrap_or_else(|| DEFAULT_PROJECT_STATUS.to_string()),
            project_type: self.project_type,
            contract_address: self.contract_address,
            extras: self.extras.unwrap_or_else(|| Value::Object(Default::default())),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "type")]
    pub project_type: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub extras: Option<Value>,
}

impl UpdateProject {
    pub fn is_empty(&self) -> bool {
        self == &UpdateProject::default()
    }

    /// Apply to an in-memory record
    pub fn apply_to(self, project: &mut Project, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = Some(description);
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(project_type) = self.project_type {
            project.project_type = project_type;
        }
        if let Some(contract_address) = self.contract_address {
            project.contract_address = Some(contract_address);
        }
        if let Some(extras) = self.extras {
            project.extras = extras;
        }
        project.updated_at = now;
    }
}
