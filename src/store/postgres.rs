// src/store/postgres.rs
//! Postgres-backed project store. Schema lives in ./migrations and is
//! applied on startup by db::create_pool.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use super::{ProjectStore, StoreError};
use crate::models::project::{Asset, AssetKind, Project, ProjectOverrides, ProjectStatus};

pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Status and kind are stored as TEXT; these row types carry the raw
// strings and the From conversions parse them.

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: String,
    user_id: String,
    source_url: String,
    status: String,
    title: Option<String>,
    description: Option<String>,
    duration_seconds: Option<i64>,
    thumbnail_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = ProjectStatus::from_str(&row.status).map_err(StoreError::Corrupt)?;
        Ok(Project {
            id: row.id,
            user_id: row.user_id,
            source_url: row.source_url,
            status,
            title: row.title,
            description: row.description,
            duration_seconds: row.duration_seconds,
            thumbnail_url: row.thumbnail_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AssetRow {
    id: String,
    project_id: String,
    kind: String,
    content: Option<String>,
    file_url: Option<String>,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = StoreError;

    fn try_from(row: AssetRow) -> Result<Self, Self::Error> {
        let kind = AssetKind::from_str(&row.kind).map_err(StoreError::Corrupt)?;
        Ok(Asset {
            id: row.id,
            project_id: row.project_id,
            kind,
            content: row.content,
            file_url: row.file_url,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn create_project(&self, user_id: &str, source_url: &str) -> Result<Project, StoreError> {
        let row: ProjectRow = sqlx::query_as(
            "INSERT INTO projects (id, user_id, source_url, status, created_at, updated_at)
             VALUES ($1, $2, $3, 'pending', NOW(), NOW())
             RETURNING id, user_id, source_url, status, title, description,
                       duration_seconds, thumbnail_url, created_at, updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(source_url)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get_project(&self, project_id: &str) -> Result<Project, StoreError> {
        let row: Option<ProjectRow> = sqlx::query_as(
            "SELECT id, user_id, source_url, status, title, description,
                    duration_seconds, thumbnail_url, created_at, updated_at
             FROM projects WHERE id = $1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StoreError::ProjectNotFound(project_id.to_string())),
        }
    }

    async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>, StoreError> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            "SELECT id, user_id, source_url, status, title, description,
                    duration_seconds, thumbnail_url, created_at, updated_at
             FROM projects WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Project::try_from).collect()
    }

    async fn update_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
        overrides: ProjectOverrides,
    ) -> Result<(), StoreError> {
        // COALESCE keeps the stored value whenever an override is null, so
        // the terminal transition cannot wipe ingestion enrichment.
        let result = sqlx::query(
            "UPDATE projects
             SET status = $2,
                 title = COALESCE($3, title),
                 description = COALESCE($4, description),
                 duration_seconds = COALESCE($5, duration_seconds),
                 thumbnail_url = COALESCE($6, thumbnail_url),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(project_id)
        .bind(status.as_str())
        .bind(overrides.title)
        .bind(overrides.description)
        .bind(overrides.duration_seconds)
        .bind(overrides.thumbnail_url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::ProjectNotFound(project_id.to_string()));
        }
        Ok(())
    }

    async fn create_asset(
        &self,
        project_id: &str,
        kind: AssetKind,
        content: Option<String>,
        file_url: Option<String>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Asset, StoreError> {
        let row: AssetRow = sqlx::query_as(
            "INSERT INTO assets (id, project_id, kind, content, file_url, metadata, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW())
             RETURNING id, project_id, kind, content, file_url, metadata, created_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(project_id)
        .bind(kind.as_str())
        .bind(content)
        .bind(file_url)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_assets(&self, project_id: &str) -> Result<Vec<Asset>, StoreError> {
        let rows: Vec<AssetRow> = sqlx::query_as(
            "SELECT id, project_id, kind, content, file_url, metadata, created_at
             FROM assets WHERE project_id = $1 ORDER BY created_at ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Asset::try_from).collect()
    }
}
