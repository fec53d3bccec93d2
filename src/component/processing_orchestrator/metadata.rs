//! Read-only accessors for the serving layer.
//!
//! Every mapping goes through [`VariantMetadata`], the single source of a
//! variant's FPS, clip offset and timeline bounds.

use super::cache_index::ProcessingInfo;
use super::layout::OutputLayout;
use crate::component::frame_extractor::{FrameRecord, FrameTimestampTable, TIMESTAMP_TABLE_FILE};
use crate::component::timeline_mapper::{TimelineBound, TimelineMapping};
use crate::error::{PipelineError, PipelineResult};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantMetadata {
    pub video_id: String,
    pub variant_key: String,
    pub fps: f64,
    pub canonical_fps: f64,
    pub clip_start_canonical_frame: u64,
    pub duration: f64,
    pub frame_count: u64,
    pub canonical_duration: f64,
}

impl VariantMetadata {
    #[must_use]
    pub const fn mapping(&self) -> TimelineMapping {
        TimelineMapping::new(self.canonical_fps, self.fps, self.clip_start_canonical_frame)
    }

    /// Variant timeline bound: the last extracted frame when known.
    #[must_use]
    pub const fn variant_bound(&self) -> TimelineBound {
        if self.frame_count > 0 {
            TimelineBound::MaxFrame(self.frame_count - 1)
        } else {
            TimelineBound::Duration(self.duration)
        }
    }

    #[must_use]
    pub const fn canonical_bound(&self) -> TimelineBound {
        TimelineBound::Duration(self.canonical_duration)
    }
}

pub fn get_variant_metadata(output_root: &Path, video_id: &str, variant_key: &str) -> PipelineResult<VariantMetadata> {
    let info = load_info(output_root, video_id)?;
    let record = info.variants.get(variant_key).ok_or_else(|| {
        PipelineError::Config(format!("video '{video_id}' has no built variant '{variant_key}'"))
    })?;

    Ok(VariantMetadata {
        video_id: video_id.to_string(),
        variant_key: variant_key.to_string(),
        fps: record.fps,
        canonical_fps: info.canonical_fps,
        clip_start_canonical_frame: record.clip_start_canonical_frame,
        duration: record.duration_seconds,
        frame_count: record.frame_count,
        canonical_duration: info.canonical.duration_seconds,
    })
}

/// Frame table of a variant, ordered by frame index.
pub fn get_frame_timestamps(output_root: &Path, video_id: &str, variant_key: &str) -> PipelineResult<Vec<FrameRecord>> {
    let frames_dir = OutputLayout::new(output_root, video_id).frames_dir(variant_key);
    let table = FrameTimestampTable::load(&frames_dir.join(TIMESTAMP_TABLE_FILE))?;
    table.validate()?;
    Ok(table.records(&frames_dir))
}

pub fn map_canonical_to_variant(metadata: &VariantMetadata, canonical_frame: f64) -> PipelineResult<u64> {
    Ok(metadata
        .mapping()
        .to_variant(canonical_frame, metadata.variant_bound())?)
}

pub fn map_variant_to_canonical(metadata: &VariantMetadata, variant_frame: f64) -> PipelineResult<u64> {
    Ok(metadata
        .mapping()
        .to_canonical(variant_frame, metadata.canonical_bound())?)
}

fn load_info(output_root: &Path, video_id: &str) -> PipelineResult<ProcessingInfo> {
    let path = OutputLayout::new(output_root, video_id).processing_info_path();
    ProcessingInfo::load(&path)?
        .ok_or_else(|| PipelineError::Config(format!("video '{video_id}' has not been processed")))
}
