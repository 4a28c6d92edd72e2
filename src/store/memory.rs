// src/store/memory.rs
//! In-memory project store used when no database is configured.
//! Explicitly constructed and injected at startup (or per test case) so
//! instances stay independent; identical contract shape to Postgres.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ProjectStore, StoreError};
use crate::models::project::{Asset, AssetKind, Project, ProjectOverrides, ProjectStatus};

pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    projects: HashMap<String, Project>,
    // Flat list keeps global creation order; list_assets filters by project.
    assets: Vec<Asset>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project(&self, user_id: &str, source_url: &str) -> Result<Project, StoreError> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            source_url: source_url.to_string(),
            status: ProjectStatus::Pending,
            title: None,
            description: None,
            duration_seconds: None,
            thumbnail_url: None,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        inner.projects.insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn get_project(&self, project_id: &str) -> Result<Project, StoreError> {
        let inner = self.inner.read().await;
        inner
            .projects
            .get(project_id)
            .cloned()
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))
    }

    async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn update_project_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
        overrides: ProjectOverrides,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let project = inner
            .projects
            .get_mut(project_id)
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;

        project.status = status;
        if let Some(title) = overrides.title {
            project.title = Some(title);
        }
        if let Some(description) = overrides.description {
            project.description = Some(description);
        }
        if let Some(duration) = overrides.duration_seconds {
            project.duration_seconds = Some(duration);
        }
        if let Some(thumbnail) = overrides.thumbnail_url {
            project.thumbnail_url = Some(thumbnail);
        }
        project.updated_at = Utc::now();
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
        let mut inner = self.inner.write().await;
        if !inner.projects.contains_key(project_id) {
            return Err(StoreError::ProjectNotFound(project_id.to_string()));
        }

        let asset = Asset {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            kind,
            content,
            file_url,
            metadata,
            created_at: Utc::now(),
        };
        inner.assets.push(asset.clone());
        Ok(asset)
    }

    async fn list_assets(&self, project_id: &str) -> Result<Vec<Asset>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .assets
            .iter()
            .filter(|a| a.project_id == project_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_project_starts_pending() {
        let store = MemoryStore::new();
        let project = store
            .create_project("user-1", "https://youtube.com/watch?v=abc")
            .await
            .unwrap();

        assert_eq!(project.status, ProjectStatus::Pending);
        assert!(project.title.is_none());

        let fetched = store.get_project(&project.id).await.unwrap();
        assert_eq!(fetched.id, project.id);
        assert_eq!(fetched.status, ProjectStatus::Pending);
    }

    #[tokio::test]
    async fn test_none_override_never_clears_metadata() {
        let store = MemoryStore::new();
        let project = store.create_project("user-1", "https://example.com/v").await.unwrap();

        // Ingestion enrichment writes the metadata fields.
        store
            .update_project_status(
                &project.id,
                ProjectStatus::Processing,
                ProjectOverrides {
                    title: Some("A Title".to_string()),
                    duration_seconds: Some(600),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // The terminal transition passes no overrides and must not wipe them.
        store
            .update_project_status(&project.id, ProjectStatus::Completed, ProjectOverrides::default())
            .await
            .unwrap();

        let fetched = store.get_project(&project.id).await.unwrap();
        assert_eq!(fetched.status, ProjectStatus::Completed);
        assert_eq!(fetched.title.as_deref(), Some("A Title"));
        assert_eq!(fetched.duration_seconds, Some(600));
    }

    #[tokio::test]
    async fn test_assets_listed_in_creation_order() {
        let store = MemoryStore::new();
        let project = store.create_project("user-1", "https://example.com/v").await.unwrap();

        for i in 1..=3 {
            store
                .create_asset(
                    &project.id,
                    AssetKind::Tweet,
                    Some(format!("tweet {}", i)),
                    None,
                    Some(serde_json::json!({ "tweet_number": i })),
                )
                .await
                .unwrap();
        }

        let assets = store.list_assets(&project.id).await.unwrap();
        assert_eq!(assets.len(), 3);
        for (i, asset) in assets.iter().enumerate() {
            assert_eq!(asset.content.as_deref(), Some(format!("tweet {}", i + 1).as_str()));
        }
    }

    #[tokio::test]
    async fn test_get_project_is_stable_without_writes() {
        let store = MemoryStore::new();
        let project = store.create_project("user-1", "https://example.com/v").await.unwrap();

        let first = store.get_project(&project.id).await.unwrap();
        let second = store.get_project(&project.id).await.unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_owners_do_not_see_each_others_projects() {
        let store = MemoryStore::new();
        let url = "https://youtube.com/watch?v=same";
        let a = store.create_project("owner-a", url).await.unwrap();
        let b = store.create_project("owner-b", url).await.unwrap();
        assert_ne!(a.id, b.id);

        let a_projects = store.list_projects("owner-a").await.unwrap();
        assert_eq!(a_projects.len(), 1);
        assert_eq!(a_projects[0].id, a.id);

        let b_projects = store.list_projects("owner-b").await.unwrap();
        assert_eq!(b_projects.len(), 1);
        assert_eq!(b_projects[0].id, b.id);
    }

    #[tokio::test]
    async fn test_asset_for_unknown_project_is_rejected() {
        let store = MemoryStore::new();
        let result = store
            .create_asset("missing", AssetKind::Blog, Some("text".to_string()), None, None)
            .await;
        assert!(matches!(result, Err(StoreError::ProjectNotFound(_))));
    }
}
