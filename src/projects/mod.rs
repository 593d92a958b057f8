//! # Projects
//!
//! Project records, their persistence and the project service.

pub mod model;
pub mod repository;
pub mod service;

pub use model::{NewProject, Project, UpdateProject};
pub use repository::{InMemoryProjectRepository, PgProjectRepository, ProjectRepository};
pub use service::ProjectService;
