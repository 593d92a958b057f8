//! Project persistence behind a trait, with Postgres and in-memory backends.

use super::model::{NewProject, Project, UpdateProject, DEFAULT_PROJECT_STATUS};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const PROJECT_COLUMNS: &str =
    "uuid, name, description, status, project_type, contract_address, extras, created_at, updated_at";

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, new_project: NewProject) -> Result<Project>;

    /// All projects, oldest first
    async fn list(&self) -> Result<Vec<Project>>;

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<Project>>;

    /// `None` when no project has `uuid`
    async fn update(&self, uuid: Uuid, changes: UpdateProject) -> Result<Option<Project>>;

    /// The deleted record, or `None` when no project has `uuid`
    async fn delete(&self, uuid: Uuid) -> Result<Option<Project>>;
}

pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self, new_project: NewProject) -> Result<Project> {
        let sql = format!(
            r#"
            INSERT INTO projects (uuid, name, description, status, project_type, contract_address, extras, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_project.name)
            .bind(&new_project.description)
            .bind(
                new_project
                    .status
                    .as_deref()
                    .unwrap_or(DEFAULT_PROJECT_STATUS),
            )
            .bind(&new_project.project_type)
            .bind(&new_project.contract_address)
            .bind(
                new_project
                    .extras
                    .unwrap_or_else(|| Value::Object(Default::default())),
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(project)
    }

    async fn list(&self) -> Result<Vec<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at ASC");
        let projects = sqlx::query_as::<_, Project>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(projects)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE uuid = $1");
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn update(&self, uuid: Uuid, changes: UpdateProject) -> Result<Option<Project>> {
        let sql = format!(
            r#"
            UPDATE projects SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                project_type = COALESCE($5, project_type),
                contract_address = COALESCE($6, contract_address),
                extras = COALESCE($7, extras),
                updated_at = NOW()
            WHERE uuid = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );

        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(uuid)
            .bind(changes.name)
            .bind(changes.description)
            .bind(changes.status)
            .bind(changes.project_type)
            .bind(changes.contract_address)
            .bind(changes.extras)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn delete(&self, uuid: Uuid) -> Result<Option<Project>> {
        let sql = format!("DELETE FROM projects WHERE uuid = $1 RETURNING {PROJECT_COLUMNS}");
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }
}

/// Process-local store for tests and embedded use
#[derive(Default)]
pub struct InMemoryProjectRepository {
    projects: RwLock<HashMap<Uuid, Project>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.projects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.read().is_empty()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn create(&self, new_project: NewProject) -> Result<Project> {
        let project = new_project.into_project(Uuid::new_v4(), Utc::now());
        self.projects.write().insert(project.uuid, project.clone());
        Ok(project)
    }

    async fn list(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self.projects.read().values().cloned().collect();
        projects.sort_by_key(|p| p.created_at);
        Ok(projects)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<Project>> {
        Ok(self.projects.read().get(&uuid).cloned())
    }

    async fn update(&self, uuid: Uuid, changes: UpdateProject) -> Result<Option<Project>> {
        let mut projects = self.projects.write();
        Ok(projects.get_mut(&uuid).map(|project| {
            changes.apply_to(project, Utc::now());
            project.clone()
        }))
    }

    async fn delete(&self, uuid: Uuid) -> Result<Option<Project>> {
        Ok(self.projects.write().remove(&uuid))
    }
}
