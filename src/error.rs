//! Error taxonomy for pipeline steps.
//!
//! Every step of the pipeline returns [`PipelineError`] so the orchestrator can
//! decide whether to retry, and report failures per video and per variant.

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error;

use crate::component::timeline_mapper::MappingError;

/// Result alias used by the pipeline components.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed or contradictory video, variant or clip descriptor.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The source file is absent or unreadable.
    #[error("Source video missing or unreadable at {path}: {reason}")]
    SourceMissing { path: PathBuf, reason: String },

    /// ffmpeg exited with a non-zero status (or could not be started).
    #[error("{step} failed: {stderr}")]
    Encoding { step: String, stderr: String },

    /// An otherwise successful encode produced an artifact that does not hold
    /// its duration, frame rate or frame count invariants.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Frame decoding failed partway through extraction.
    #[error("Frame extraction failed after {} of {} frames: {message}", extracted.len(), extracted.len() + missing.len())]
    Extraction {
        message: String,
        /// Dense frame indices that were written.
        extracted: Vec<u64>,
        /// Dense frame indices that could not be written.
        missing: Vec<u64>,
    },

    /// Frame index conversion rejected its inputs.
    #[error("Mapping failed: {0}")]
    Mapping(#[from] MappingError),

    /// ffprobe could not read an artifact.
    #[error("Probe failed: {0}")]
    Probe(String),

    /// Another run in this process is writing the same video.
    #[error("Video '{video_id}' is already being processed")]
    Busy { video_id: String },

    /// The shutdown signal was raised while the step was running.
    #[error("Operation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl PipelineError {
    /// Whether the step that produced this error is worth one more attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Encoding { .. } | Self::Validation(_))
    }

    /// Short machine-friendly name of the error class, used in reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::SourceMissing { .. } => "source_missing",
            Self::Encoding { .. } => "encoding",
            Self::Validation(_) => "validation",
            Self::Extraction { .. } => "extraction",
            Self::Mapping(_) => "mapping",
            Self::Probe(_) => "probe",
            Self::Busy { .. } => "busy",
            Self::Cancelled => "cancelled",
            Self::Io(_) => "io",
        }
    }
}
