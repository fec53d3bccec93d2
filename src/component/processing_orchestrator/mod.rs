//! Per-video pipeline driver
//!
//! Normalizes each configured source, builds its variants and frame sets on a
//! worker pool, skips what is already current, and reports per variant.

mod cache_index;
mod layout;
mod main;
mod metadata;
mod report;
mod video_lock;

pub use cache_index::{ProcessingInfo, SourceFingerprint, VariantRecord};
pub use layout::OutputLayout;
pub use main::{ProcessingOrchestrator, RunOptions};
pub use metadata::{
    VariantMetadata, get_frame_timestamps, get_variant_metadata, map_canonical_to_variant,
    map_variant_to_canonical,
};
pub use report::{FailureReport, RunReport, RunSummary, StepOutcome, VariantReport, VideoReport};
pub use video_lock::VideoLock;
