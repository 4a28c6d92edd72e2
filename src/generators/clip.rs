// src/generators/clip.rs
//! Clip reference generation for key moments.
//!
//! Lightweight mode returns the source URL with a start-offset marker and
//! cannot fail. Heavyweight mode (CLIP_RENDERING=ffmpeg) extracts the
//! sub-range with ffmpeg, center-crops to 9:16, and encodes an mp4 under
//! outputs/clips; there is no safe degraded substitute for a missing
//! media file, so failures on that path propagate.

use std::process::Stdio;
use tokio::process::Command;

use crate::models::project::KeyMoment;
use crate::pipeline::FailurePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipMode {
    /// Point at the source video with a start-offset marker.
    Reference,
    /// Extract, crop, and encode the actual sub-range.
    Render,
}

impl ClipMode {
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("ffmpeg") => ClipMode::Render,
            _ => ClipMode::Reference,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("ffmpeg is not installed: {0}")]
    ToolMissing(String),
    #[error("clip encode failed: {0}")]
    Encode(String),
}

pub struct ClipRenderer {
    mode: ClipMode,
    output_dir: String,
}

impl ClipRenderer {
    pub const FAILURE_POLICY: FailurePolicy = FailurePolicy::Propagate;

    pub fn from_env() -> Self {
        let mode = ClipMode::from_env_value(std::env::var("CLIP_RENDERING").ok().as_deref());
        Self {
            mode,
            output_dir: "outputs/clips".to_string(),
        }
    }

    pub fn reference_only() -> Self {
        Self {
            mode: ClipMode::Reference,
            output_dir: "outputs/clips".to_string(),
        }
    }

    pub fn mode(&self) -> ClipMode {
        self.mode
    }

    /// Produce a shareable reference for one key moment.
    pub async fn clip_reference(
        &self,
        project_id: &str,
        source_url: &str,
        moment: &KeyMoment,
        clip_number: usize,
    ) -> Result<String, ClipError> {
        match self.mode {
            ClipMode::Reference => Ok(offset_reference(source_url, moment.start_seconds)),
            ClipMode::Render => {
                self.render_clip(project_id, source_url, moment, clip_number).await
            }
        }
    }

    // Expects a directly fetchable media URL or a local file path as
    // input; page URLs must be resolved to media upstream.
    async fn render_clip(
        &self,
        project_id: &str,
        source: &str,
        moment: &KeyMoment,
        clip_number: usize,
    ) -> Result<String, ClipError> {
        check_ffmpeg_installed().await?;

        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            return Err(ClipError::Encode(format!(
                "failed to create clip output directory: {}",
                e
            )));
        }

        let output_path = format!("{}/{}_clip_{}.mp4", self.output_dir, project_id, clip_number);

        tracing::info!(
            "🎬 Rendering clip {} ({}s - {}s) for project {}",
            clip_number,
            moment.start_seconds,
            moment.end_seconds,
            project_id
        );

        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-ss")
            .arg(moment.start_seconds.to_string())
            .arg("-t")
            .arg(moment.duration_seconds.to_string())
            .arg("-i")
            .arg(source)
            // Centered crop to a 9:16 portrait frame.
            .arg("-vf")
            .arg("crop=ih*9/16:ih:(iw-ih*9/16)/2:0,scale=1080:1920")
            .arg("-c:v")
            .arg("libx264")
            .arg("-preset")
            .arg("veryfast")
            .arg("-c:a")
            .arg("aac")
            .arg(&output_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ClipError::Encode(format!("failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClipError::Encode(stderr.to_string()));
        }

        Ok(output_path)
    }
}

fn offset_reference(source_url: &str, start_seconds: i64) -> String {
    let separator = if source_url.contains('?') { '&' } else { '?' };
    format!("{}{}t={}", source_url, separator, start_seconds)
}

async fn check_ffmpeg_installed() -> Result<(), ClipError> {
    let status = Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(ClipError::ToolMissing(
            "install ffmpeg to enable clip rendering".to_string(),
        )),
    }
}
