//! # Project Service
//!
//! Project lifecycle (create, list, find, update, remove) and the entry point
//! for per-project administrative actions.

use super::model::{NewProject, Project, UpdateProject};
use super::repository::ProjectRepository;
use crate::actions::types::{ActionOutcome, ActionRequest};
use crate::error::{RahatError, Result};
use crate::events::{EventPublisher, ProjectEvent};
use crate::orchestration::dispatcher::ActionDispatcher;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const PROJECT_ENTITY: &str = "Project";

pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
    publisher: EventPublisher,
    dispatcher: Arc<ActionDispatcher>,
}

impl ProjectService {
    pub fn new(
        repository: Arc<dyn ProjectRepository>,
        publisher: EventPublisher,
        dispatcher: Arc<ActionDispatcher>,
    ) -> Self {
        Self {
            repository,
            publisher,
            dispatcher,
        }
    }

    /// Persist a project and announce it
    pub async fn create(&self, new_project: NewProject) -> Result<Project> {
        if new_project.name.trim().is_empty() {
            return Err(RahatError::validation("project name must not be empty"));
        }

        let project = self.repository.create(new_project).await?;
        info!(uuid = %project.uuid, name = %project.name, "Project created");

        let payload = serde_json::to_value(&project)
            .map_err(|e| RahatError::validation(format!("project is not serializable: {e}")))?;
        self.publisher.publish(ProjectEvent::ProjectCreated, payload);

        Ok(project)
    }

    pub async fn list(&self) -> Result<Vec<Project>> {
        self.repository.list().await
    }

    pub async fn find_one(&self, uuid: Uuid) -> Result<Project> {
        debug!(uuid = %uuid, "Finding project");
        self.repository
            .find_by_uuid(uuid)
            .await?
            .ok_or_else(|| RahatError::not_found(PROJECT_ENTITY, uuid))
    }

    pub async fn update(&self, uuid: Uuid, changes: UpdateProject) -> Result<Project> {
        let project = self
            .repository
            .update(uuid, changes)
            .await?
            .ok_or_else(|| RahatError::not_found(PROJECT_ENTITY, uuid))?;
        info!(uuid = %uuid, "Project updated");
        Ok(project)
    }

    pub async fn remove(&self, uuid: Uuid) -> Result<Project> {
        let project = self
            .repository
            .delete(uuid)
            .await?
            .ok_or_else(|| RahatError::not_found(PROJECT_ENTITY, uuid))?;
        info!(uuid = %uuid, "Project removed");
        Ok(project)
    }

    /// Route a per-project action through the dispatcher
    pub async fn handle_project_actions(&self, request: ActionRequest) -> Result<ActionOutcome> {
        Ok(self.dispatcher.dispatch(request).await?)
    }
}
