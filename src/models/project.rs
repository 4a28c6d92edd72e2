// src/models/project.rs
//! Project and asset records plus the ingestion payload the pipeline consumes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a project. Transitions only ever move
/// pending -> processing -> {completed | failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::Processing => "processing",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Failed)
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProjectStatus::Pending),
            "processing" => Ok(ProjectStatus::Processing),
            "completed" => Ok(ProjectStatus::Completed),
            "failed" => Ok(ProjectStatus::Failed),
            other => Err(format!("unknown project status: {}", other)),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of generated asset. Text kinds carry `content`, media kinds carry
/// `file_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Blog,
    LinkedinPost,
    Tweet,
    VideoClip,
    Image,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Blog => "blog",
            AssetKind::LinkedinPost => "linkedin_post",
            AssetKind::Tweet => "tweet",
            AssetKind::VideoClip => "video_clip",
            AssetKind::Image => "image",
        }
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blog" => Ok(AssetKind::Blog),
            "linkedin_post" => Ok(AssetKind::LinkedinPost),
            "tweet" => Ok(AssetKind::Tweet),
            "video_clip" => Ok(AssetKind::VideoClip),
            "image" => Ok(AssetKind::Image),
            other => Err(format!("unknown asset kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub source_url: String,
    pub status: ProjectStatus,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub project_id: String,
    pub kind: AssetKind,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Optional project fields merged by `update_project_status`. A `None`
/// here never overwrites a stored value.
#[derive(Debug, Clone, Default)]
pub struct ProjectOverrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<i64>,
    pub thumbnail_url: Option<String>,
}

/// Normalized output of the video ingestion step.
#[derive(Debug, Clone)]
pub struct VideoData {
    pub title: String,
    pub description: String,
    pub duration_seconds: i64,
    pub thumbnail_url: String,
    pub transcript: String,
    pub key_moments: Vec<KeyMoment>,
    pub key_quotes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMoment {
    pub start_seconds: i64,
    pub end_seconds: i64,
    pub duration_seconds: i64,
    pub description: String,
    pub confidence: f64,
}

// Per-kind metadata shapes. They are serialized into the open `metadata`
// value on the asset record; consumers tolerate extra keys.

#[derive(Debug, Serialize, Deserialize)]
pub struct BlogMetadata {
    pub word_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkedinPostMetadata {
    pub post_number: usize,
    pub character_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TweetMetadata {
    pub tweet_number: usize,
    pub character_count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub quote_number: usize,
    pub quote_text: String,
    pub format: String,
    pub dimensions: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClipMetadata {
    pub clip_number: usize,
    pub start_seconds: i64,
    pub end_seconds: i64,
    pub duration_seconds: i64,
    pub description: String,
    pub aspect_ratio: String,
}

// Wire types for the project endpoints

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub video_url: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub user_id: String,
    pub source_url: String,
    pub status: ProjectStatus,
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        ProjectResponse {
            id: project.id,
            user_id: project.user_id,
            source_url: project.source_url,
            status: project.status,
            title: project.title,
            description: project.description,
            duration_seconds: project.duration_seconds,
            thumbnail_url: project.thumbnail_url,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub assets: Vec<Asset>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ProjectStatus::Pending,
            ProjectStatus::Processing,
            ProjectStatus::Completed,
            ProjectStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_only_end_states_are_terminal() {
        assert!(!ProjectStatus::Pending.is_terminal());
        assert!(!ProjectStatus::Processing.is_terminal());
        assert!(ProjectStatus::Completed.is_terminal());
        assert!(ProjectStatus::Failed.is_terminal());
    }

    #[test]
    fn test_asset_kind_serializes_snake_case() {
        let json = serde_json::to_string(&AssetKind::LinkedinPost).unwrap();
        assert_eq!(json, "\"linkedin_post\"");
        assert_eq!("video_clip".parse::<AssetKind>().unwrap(), AssetKind::VideoClip);
    }
}
