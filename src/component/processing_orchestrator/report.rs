use crate::error::PipelineError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Generated,
    Skipped,
    Validated,
    Failed,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Generated => "generated",
            Self::Skipped => "skipped",
            Self::Validated => "validated",
            Self::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureReport {
    pub kind: String,
    pub message: String,
}

impl From<&PipelineError> for FailureReport {
    fn from(error: &PipelineError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantReport {
    pub key: String,
    pub outcome: StepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReport>,
}

impl VariantReport {
    #[must_use]
    pub fn succeeded(key: &str, outcome: StepOutcome, frame_count: u64, duration_seconds: f64) -> Self {
        Self {
            key: key.to_string(),
            outcome,
            frame_count: Some(frame_count),
            duration_seconds: Some(duration_seconds),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(key: &str, error: &PipelineError) -> Self {
        Self {
            key: key.to_string(),
            outcome: StepOutcome::Failed,
            frame_count: None,
            duration_seconds: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self.outcome, StepOutcome::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoReport {
    pub video_id: String,
    pub canonical: StepOutcome,
    /// Fatal error for the whole video (source or canonical failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureReport>,
    pub variants: Vec<VariantReport>,
}

impl VideoReport {
    #[must_use]
    pub fn failed(video_id: &str, error: &PipelineError) -> Self {
        Self {
            video_id: video_id.to_string(),
            canonical: StepOutcome::Failed,
            error: Some(error.into()),
            variants: Vec::new(),
        }
    }

    #[must_use]
    pub fn variant(&self, key: &str) -> Option<&VariantReport> {
        self.variants.iter().find(|v| v.key == key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub videos: usize,
    pub failed_videos: usize,
    pub generated: usize,
    pub skipped: usize,
    pub validated: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub videos: Vec<VideoReport>,
    pub elapsed_seconds: f64,
}

impl RunReport {
    #[must_use]
    pub fn video(&self, video_id: &str) -> Option<&VideoReport> {
        self.videos.iter().find(|v| v.video_id == video_id)
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            videos: self.videos.len(),
            ..RunSummary::default()
        };
        for video in &self.videos {
            if video.error.is_some() {
                summary.failed_videos += 1;
            }
            for variant in &video.variants {
                match variant.outcome {
                    StepOutcome::Generated => summary.generated += 1,
                    StepOutcome::Skipped => summary.skipped += 1,
                    StepOutcome::Validated => summary.validated += 1,
                    StepOutcome::Failed => summary.failed += 1,
                }
            }
        }
        summary
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        let summary = self.summary();
        summary.failed > 0 || summary.failed_videos > 0
    }
}
