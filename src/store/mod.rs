// src/store/mod.rs
//! Durable record of project lifecycle state and generated assets.
//! Two backends share one contract: Postgres when DATABASE_URL is set,
//! an in-memory substitute otherwise. Store failures always propagate to
//! the pipeline run boundary.

use async_trait::async_trait;

use crate::models::project::{Asset, AssetKind, Project, ProjectOverrides, ProjectStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgProjectStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Contract for project/asset persistence. Each operation is an
/// independent round-trip; no multi-operation transaction wraps a
/// pipeline run.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert a new project in `pending` state and return the stored record.
    async fn create_project(&self, user_id: &str, source_url: &str) -> Result<Project, StoreError>;

    async fn get_project(&self, project_id: &str) -> Result<Project, StoreError>;

    /// All projects for one owner, newest first.
    async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>, StoreError>;

    /// Write a status transition, merging only the non-null override
    /// fields. A `None` override never clears a stored value.
    async fn update_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
        overrides: ProjectOverrides,
    ) -> Result<(), StoreError>;

    async fn create_asset(
        &self,
        project_id: &str,
        kind: AssetKind,
        content: Option<String>,
        file_url: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Asset, StoreError>;

    /// All assets for a project in creation order.
    async fn list_assets(&self, project_id: &str) -> Result<Vec<Asset>, StoreError>;
}
