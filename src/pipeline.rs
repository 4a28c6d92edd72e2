// src/pipeline.rs
//! Asset-generation orchestration pipeline.
//!
//! One run per project: transition the project through its lifecycle,
//! ingest the video once, then fan out into text, visual, and clip
//! generation, persisting every asset as it is produced. Generation
//! collaborators marked `FailurePolicy::Degrade` recover locally and may
//! not fail a run; store errors and heavyweight clip rendering errors
//! propagate to the single catch-all boundary in `run`, which records the
//! failed transition and swallows the error (the run executes detached
//! from the request that scheduled it).

use futures::future::join_all;
use std::sync::Arc;

use crate::generators::clip::{ClipError, ClipMode, ClipRenderer};
use crate::generators::text;
use crate::generators::visual::QuoteGraphicGenerator;
use crate::ingestion::VideoIngester;
use crate::models::project::{
    AssetKind, BlogMetadata, ClipMetadata, ImageMetadata, LinkedinPostMetadata,
    ProjectOverrides, ProjectStatus, TweetMetadata, VideoData,
};
use crate::store::{ProjectStore, StoreError};

/// How a collaborator behaves when its upstream fails. Declared as an
/// associated const on each collaborator so the fail-soft/fail-hard
/// split stays centrally auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Recovers locally with a fallback value; never fails a run.
    Degrade,
    /// No safe substitute exists; errors terminate the run.
    Propagate,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Degrade => "degrade",
            FailurePolicy::Propagate => "propagate",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("clip rendering failed: {0}")]
    Clip(#[from] ClipError),
}

pub struct Pipeline {
    store: Arc<dyn ProjectStore>,
    ingester: VideoIngester,
    visuals: QuoteGraphicGenerator,
    clips: ClipRenderer,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        ingester: VideoIngester,
        visuals: QuoteGraphicGenerator,
        clips: ClipRenderer,
    ) -> Self {
        Self {
            store,
            ingester,
            visuals,
            clips,
        }
    }

    /// Schedule a detached run. Fire-and-forget relative to the request
    /// that triggered it; there is no return channel.
    pub fn spawn_run(self: Arc<Self>, project_id: String, source_url: String) {
        tokio::spawn(async move {
            self.run(project_id, source_url).await;
        });
    }

    /// One end-to-end run. The single place unhandled stage errors are
    /// caught: any `Err` forces the failed transition and is then
    /// swallowed. Failures stay observable through project status and
    /// log output only.
    pub async fn run(&self, project_id: String, source_url: String) {
        tracing::info!("🚀 Starting pipeline run for project {}", project_id);

        match self.execute(&project_id, &source_url).await {
            Ok(true) => {
                tracing::info!("✅ Pipeline completed for project {}", project_id);
            }
            Ok(false) => {
                // Duplicate run rejected; nothing was touched.
            }
            Err(e) => {
                tracing::error!("Pipeline failed for project {}: {}", project_id, e);
                if let Err(status_err) = self
                    .store
                    .update_project_status(&project_id, ProjectStatus::Failed, ProjectOverrides::default())
                    .await
                {
                    tracing::error!(
                        "Failed to record failed status for project {}: {}",
                        project_id,
                        status_err
                    );
                }
            }
        }
    }

    /// Staged body. Returns Ok(false) when the run is rejected because
    /// the project already reached a terminal state (duplicate trigger).
    async fn execute(&self, project_id: &str, source_url: &str) -> Result<bool, PipelineError> {
        let project = self.store.get_project(project_id).await?;
        if project.status.is_terminal() {
            tracing::warn!(
                "Rejecting pipeline run for project {}: already {}",
                project_id,
                project.status
            );
            return Ok(false);
        }

        self.store
            .update_project_status(project_id, ProjectStatus::Processing, ProjectOverrides::default())
            .await?;

        // Stage 1: ingestion. Fail-soft; a broken upstream degrades the
        // data instead of aborting the run.
        let video = self.ingester.ingest(source_url).await;
        self.store
            .update_project_status(
                project_id,
                ProjectStatus::Processing,
                ProjectOverrides {
                    title: Some(video.title.clone()),
                    description: Some(video.description.clone()),
                    duration_seconds: Some(video.duration_seconds),
                    thumbnail_url: if video.thumbnail_url.is_empty() {
                        None
                    } else {
                        Some(video.thumbnail_url.clone())
                    },
                },
            )
            .await?;

        // Stages 2-4: independent fan-out over disjoint asset kinds.
        tracing::info!("Stage 2: text asset generation for project {}", project_id);
        self.generate_text_assets(project_id, &video).await?;

        tracing::info!("Stage 3: visual asset generation for project {}", project_id);
        self.generate_visual_assets(project_id, &video).await?;

        tracing::info!("Stage 4: clip reference generation for project {}", project_id);
        self.generate_clip_assets(project_id, source_url, &video).await?;

        self.store
            .update_project_status(project_id, ProjectStatus::Completed, ProjectOverrides::default())
            .await?;

        Ok(true)
    }

    async fn generate_text_assets(
        &self,
        project_id: &str,
        video: &VideoData,
    ) -> Result<(), PipelineError> {
        let blog = text::blog(
            &video.title,
            &video.description,
            &video.transcript,
            video.duration_seconds,
        );
        let word_count = blog.split_whitespace().count();
        self.store
            .create_asset(
                project_id,
                AssetKind::Blog,
                Some(blog),
                None,
                serde_json::to_value(BlogMetadata { word_count }).ok(),
            )
            .await?;

        let posts = text::linkedin_posts(&video.title, &video.description, &video.transcript);
        for (i, post) in posts.into_iter().enumerate() {
            let metadata = LinkedinPostMetadata {
                post_number: i + 1,
                character_count: post.chars().count(),
            };
            self.store
                .create_asset(
                    project_id,
                    AssetKind::LinkedinPost,
                    Some(post),
                    None,
                    serde_json::to_value(metadata).ok(),
                )
                .await?;
        }

        let tweets = text::tweets(&video.title, &video.key_quotes, &video.transcript);
        for (i, tweet) in tweets.into_iter().enumerate() {
            let metadata = TweetMetadata {
                tweet_number: i + 1,
                character_count: tweet.chars().count(),
            };
            self.store
                .create_asset(
                    project_id,
                    AssetKind::Tweet,
                    Some(tweet),
                    None,
                    serde_json::to_value(metadata).ok(),
                )
                .await?;
        }

        Ok(())
    }

    async fn generate_visual_assets(
        &self,
        project_id: &str,
        video: &VideoData,
    ) -> Result<(), PipelineError> {
        let attribution = if video.title.trim().is_empty() {
            "Content Creator"
        } else {
            &video.title
        };

        // Graphics render concurrently; persistence happens afterwards in
        // enumeration order so quote_number stays gap-free.
        let graphics = join_all(
            video
                .key_quotes
                .iter()
                .map(|quote| self.visuals.quote_graphic(quote, attribution)),
        )
        .await;

        for (i, (quote, file_url)) in video.key_quotes.iter().zip(graphics).enumerate() {
            let metadata = ImageMetadata {
                quote_number: i + 1,
                quote_text: quote.clone(),
                format: "square".to_string(),
                dimensions: "1080x1080".to_string(),
            };
            self.store
                .create_asset(
                    project_id,
                    AssetKind::Image,
                    None,
                    Some(file_url),
                    serde_json::to_value(metadata).ok(),
                )
                .await?;
        }

        Ok(())
    }

    async fn generate_clip_assets(
        &self,
        project_id: &str,
        source_url: &str,
        video: &VideoData,
    ) -> Result<(), PipelineError> {
        let aspect_ratio = match self.clips.mode() {
            ClipMode::Render => "9:16",
            ClipMode::Reference => "source",
        };

        for (i, moment) in video.key_moments.iter().enumerate() {
            let file_url = self
                .clips
                .clip_reference(project_id, source_url, moment, i + 1)
                .await?;

            let metadata = ClipMetadata {
                clip_number: i + 1,
                start_seconds: moment.start_seconds,
                end_seconds: moment.end_seconds,
                duration_seconds: moment.duration_seconds,
                description: moment.description.clone(),
                aspect_ratio: aspect_ratio.to_string(),
            };
            self.store
                .create_asset(
                    project_id,
                    AssetKind::VideoClip,
                    None,
                    Some(file_url),
                    serde_json::to_value(metadata).ok(),
                )
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::FALLBACK_TITLE;
    use crate::models::project::{Asset, Project};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_pipeline(store: Arc<dyn ProjectStore>) -> Pipeline {
        Pipeline::new(
            store,
            VideoIngester::degraded(),
            QuoteGraphicGenerator::new(None),
            ClipRenderer::reference_only(),
        )
    }

    /// Store wrapper that injects a failure on the nth create_asset call.
    struct FailingStore {
        inner: MemoryStore,
        fail_on: usize,
        calls: AtomicUsize,
    }

    impl FailingStore {
        fn new(fail_on: usize) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_on,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProjectStore for FailingStore {
        async fn create_project(
            &self,
            user_id: &str,
            source_url: &str,
        ) -> Result<Project, StoreError> {
            self.inner.create_project(user_id, source_url).await
        }

        async fn get_project(&self, project_id: &str) -> Result<Project, StoreError> {
            self.inner.get_project(project_id).await
        }

        async fn list_projects(&self, user_id: &str) -> Result<Vec<Project>, StoreError> {
            self.inner.list_projects(user_id).await
        }

        async fn update_project_status(
            &self,
            project_id: &str,
            status: ProjectStatus,
            overrides: ProjectOverrides,
        ) -> Result<(), StoreError> {
            self.inner.update_project_status(project_id, status, overrides).await
        }

        async fn create_asset(
            &self,
            project_id: &str,
            kind: AssetKind,
            content: Option<String>,
            file_url: Option<String>,
            metadata: Option<serde_json::Value>,
        ) -> Result<Asset, StoreError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                return Err(StoreError::Corrupt("injected asset write failure".to_string()));
            }
            self.inner.create_asset(project_id, kind, content, file_url, metadata).await
        }

        async fn list_assets(&self, project_id: &str) -> Result<Vec<Asset>, StoreError> {
            self.inner.list_assets(project_id).await
        }
    }

    fn numbers_for(assets: &[Asset], kind: AssetKind, field: &str) -> Vec<u64> {
        assets
            .iter()
            .filter(|a| a.kind == kind)
            .map(|a| a.metadata.as_ref().unwrap()[field].as_u64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_degraded_run_completes_with_marker_blog() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = test_pipeline(store.clone());

        let project = store
            .create_project("user-1", "https://youtube.com/watch?v=abc")
            .await
            .unwrap();
        assert_eq!(project.status, ProjectStatus::Pending);

        pipeline.run(project.id.clone(), project.source_url.clone()).await;

        let finished = store.get_project(&project.id).await.unwrap();
        assert_eq!(finished.status, ProjectStatus::Completed);
        // Ingestion enrichment survived the terminal transition.
        assert_eq!(finished.title.as_deref(), Some(FALLBACK_TITLE));

        let assets = store.list_assets(&project.id).await.unwrap();
        let blog: Vec<&Asset> = assets.iter().filter(|a| a.kind == AssetKind::Blog).collect();
        assert_eq!(blog.len(), 1);
        assert!(blog[0].content.as_ref().unwrap().contains(FALLBACK_TITLE));
    }

    #[tokio::test]
    async fn test_asset_numbering_is_gap_free() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = test_pipeline(store.clone());

        let project = store
            .create_project("user-1", "https://youtube.com/watch?v=abc")
            .await
            .unwrap();
        pipeline.run(project.id.clone(), project.source_url.clone()).await;

        let assets = store.list_assets(&project.id).await.unwrap();

        let post_numbers = numbers_for(&assets, AssetKind::LinkedinPost, "post_number");
        assert_eq!(post_numbers, vec![1, 2, 3]);

        let tweet_numbers = numbers_for(&assets, AssetKind::Tweet, "tweet_number");
        assert_eq!(tweet_numbers, (1..=tweet_numbers.len() as u64).collect::<Vec<_>>());
        assert!(!tweet_numbers.is_empty());

        let quote_numbers = numbers_for(&assets, AssetKind::Image, "quote_number");
        assert_eq!(quote_numbers, (1..=quote_numbers.len() as u64).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_text_kinds_carry_content_media_kinds_carry_file_url() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = test_pipeline(store.clone());

        let project = store
            .create_project("user-1", "https://youtube.com/watch?v=abc")
            .await
            .unwrap();
        pipeline.run(project.id.clone(), project.source_url.clone()).await;

        for asset in store.list_assets(&project.id).await.unwrap() {
            match asset.kind {
                AssetKind::Blog | AssetKind::LinkedinPost | AssetKind::Tweet => {
                    assert!(asset.content.is_some());
                    assert!(asset.file_url.is_none());
                }
                AssetKind::Image | AssetKind::VideoClip => {
                    assert!(asset.content.is_none());
                    assert!(asset.file_url.is_some());
                }
            }
        }
    }

    #[tokio::test]
    async fn test_store_failure_marks_project_failed_keeps_partial_assets() {
        let store = Arc::new(FailingStore::new(3));
        let pipeline = test_pipeline(store.clone());

        let project = store
            .create_project("user-1", "https://youtube.com/watch?v=abc")
            .await
            .unwrap();
        pipeline.run(project.id.clone(), project.source_url.clone()).await;

        let finished = store.get_project(&project.id).await.unwrap();
        assert_eq!(finished.status, ProjectStatus::Failed);

        // Assets persisted before the failing write stay, in creation order.
        let assets = store.list_assets(&project.id).await.unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].kind, AssetKind::Blog);
        assert_eq!(assets[1].kind, AssetKind::LinkedinPost);
    }

    #[tokio::test]
    async fn test_duplicate_run_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = test_pipeline(store.clone());

        let project = store
            .create_project("user-1", "https://youtube.com/watch?v=abc")
            .await
            .unwrap();

        pipeline.run(project.id.clone(), project.source_url.clone()).await;
        let first_assets = store.list_assets(&project.id).await.unwrap().len();

        // A duplicate trigger must not double-generate or change status.
        pipeline.run(project.id.clone(), project.source_url.clone()).await;

        let finished = store.get_project(&project.id).await.unwrap();
        assert_eq!(finished.status, ProjectStatus::Completed);
        assert_eq!(store.list_assets(&project.id).await.unwrap().len(), first_assets);
    }

    #[tokio::test]
    async fn test_run_for_missing_project_touches_nothing() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = test_pipeline(store.clone());

        // Swallowed failure; nothing to assert beyond not panicking and
        // the store staying empty.
        pipeline
            .run("missing-id".to_string(), "https://example.com/v".to_string())
            .await;
        assert!(store.list_projects("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_independent_projects_for_different_owners() {
        let store = Arc::new(MemoryStore::new());
        let pipeline = Arc::new(test_pipeline(store.clone()));

        let url = "https://youtube.com/watch?v=shared";
        let a = store.create_project("owner-a", url).await.unwrap();
        let b = store.create_project("owner-b", url).await.unwrap();

        pipeline.run(a.id.clone(), a.source_url.clone()).await;
        pipeline.run(b.id.clone(), b.source_url.clone()).await;

        let a_projects = store.list_projects("owner-a").await.unwrap();
        let b_projects = store.list_projects("owner-b").await.unwrap();
        assert_eq!(a_projects.len(), 1);
        assert_eq!(b_projects.len(), 1);
        assert_eq!(a_projects[0].status, ProjectStatus::Completed);
        assert_eq!(b_projects[0].status, ProjectStatus::Completed);

        let a_assets = store.list_assets(&a.id).await.unwrap();
        let b_assets = store.list_assets(&b.id).await.unwrap();
        assert!(!a_assets.is_empty());
        assert_eq!(a_assets.len(), b_assets.len());
        for asset in &a_assets {
            assert_eq!(asset.project_id, a.id);
        }
    }

    #[test]
    fn test_failure_policies_are_declared() {
        assert_eq!(VideoIngester::FAILURE_POLICY, FailurePolicy::Degrade);
        assert_eq!(text::FAILURE_POLICY, FailurePolicy::Degrade);
        assert_eq!(QuoteGraphicGenerator::FAILURE_POLICY, FailurePolicy::Degrade);
        assert_eq!(ClipRenderer::FAILURE_POLICY, FailurePolicy::Propagate);
    }
}
