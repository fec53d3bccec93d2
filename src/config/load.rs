use crate::config::types::Config;
use anyhow::{Context, Result, bail};
use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

impl Config {
    /// Load and validate the pipeline configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        info!(
            "Loaded config {} ({} videos)",
            path.display(),
            config.videos.len()
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that make the whole configuration unusable. Problems local to a
    /// single variant or clip are reported later, per variant.
    pub fn validate(&self) -> Result<()> {
        if self.videos.is_empty() {
            bail!("No videos defined in configuration");
        }
        if self.workers == Some(0) {
            bail!("workers must be at least 1");
        }
        if !self.duration_tolerance_seconds.is_finite() || self.duration_tolerance_seconds <= 0.0 {
            bail!(
                "duration_tolerance_seconds must be positive, got {}",
                self.duration_tolerance_seconds
            );
        }

        let mut seen = HashSet::new();
        for video in &self.videos {
            if video.id.trim().is_empty() {
                bail!("Video configuration missing 'id'");
            }
            if video.id.contains(['/', '\\']) {
                bail!("Video id '{}' must not contain path separators", video.id);
            }
            if !seen.insert(video.id.as_str()) {
                bail!("Duplicate video id '{}'", video.id);
            }
            if video.source_video.as_os_str().is_empty() {
                bail!("Video '{}' missing 'source_video'", video.id);
            }
            if !video.canonical_fps.is_finite() || video.canonical_fps <= 0.0 {
                bail!(
                    "Video '{}' has invalid canonical_fps {}",
                    video.id,
                    video.canonical_fps
                );
            }
        }
        Ok(())
    }
}
