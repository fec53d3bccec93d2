use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_OUTPUT_ROOT: &str = "static/videos";
/// Default duration tolerance (seconds) for canonical and variant validation
pub const DEFAULT_DURATION_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// Worker pool size; derived from the CPU count when absent
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default = "default_duration_tolerance")]
    pub duration_tolerance_seconds: f64,
    pub videos: Vec<VideoConfig>,
}

/// One configured source video. Immutable for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoConfig {
    pub id: String,
    pub source_video: PathBuf,
    pub canonical_fps: f64,
    #[serde(default)]
    pub fps_variants: Vec<f64>,
    #[serde(default)]
    pub clips: Vec<ClipConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipConfig {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Canonical-timeline timecode, e.g. `00:00:02.0`
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub fps: Vec<f64>,
}

/// Which variant kinds a run should touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantFilter {
    #[default]
    All,
    Full,
    Clips,
}

impl VariantFilter {
    #[must_use]
    pub const fn includes_full(self) -> bool {
        matches!(self, Self::All | Self::Full)
    }

    #[must_use]
    pub const fn includes_clips(self) -> bool {
        matches!(self, Self::All | Self::Clips)
    }
}

impl std::fmt::Display for VariantFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Full => write!(f, "full"),
            Self::Clips => write!(f, "clips"),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_ROOT)
}

const fn default_duration_tolerance() -> f64 {
    DEFAULT_DURATION_TOLERANCE
}

impl Config {
    #[must_use]
    pub fn find_video(&self, video_id: &str) -> Option<&VideoConfig> {
        self.videos.iter().find(|v| v.id == video_id)
    }

    #[must_use]
    pub fn video_ids(&self) -> Vec<String> {
        self.videos.iter().map(|v| v.id.clone()).collect()
    }
}
