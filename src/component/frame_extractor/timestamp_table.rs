use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_TABLE_FILE: &str = "frame_timestamps.json";

/// One extracted frame: dense index, measured timestamp and its image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub index: u64,
    /// Variant-local presentation time in seconds
    pub timestamp: f64,
    pub image_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameEntry {
    pub frame_index: u64,
    pub timestamp: f64,
}

/// Persisted `frame_timestamps.json`, keyed by image file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTimestampTable {
    pub variant: String,
    pub fps: f64,
    pub total_frames: u64,
    pub frame_mapping: BTreeMap<String, FrameEntry>,
}

#[must_use]
pub fn frame_filename(index: u64) -> String {
    format!("frame_{index:06}.jpg")
}

impl FrameTimestampTable {
    /// Build a table from `(index, timestamp)` pairs in dense order.
    #[must_use]
    pub fn new(variant: &str, fps: f64, frames: &[(u64, f64)]) -> Self {
        let frame_mapping = frames
            .iter()
            .map(|&(frame_index, timestamp)| {
                (
                    frame_filename(frame_index),
                    FrameEntry {
                        frame_index,
                        timestamp,
                    },
                )
            })
            .collect();
        Self {
            variant: variant.to_string(),
            fps,
            total_frames: frames.len() as u64,
            frame_mapping,
        }
    }

    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| PipelineError::Validation(format!("unreadable {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Validation(format!("cannot serialize frame table: {e}")))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Entries ordered by frame index.
    #[must_use]
    pub fn entries(&self) -> Vec<FrameEntry> {
        let mut entries: Vec<FrameEntry> = self.frame_mapping.values().copied().collect();
        entries.sort_by_key(|e| e.frame_index);
        entries
    }

    /// Frame records with image paths resolved under `frames_dir`.
    #[must_use]
    pub fn records(&self, frames_dir: &Path) -> Vec<FrameRecord> {
        self.entries()
            .into_iter()
            .map(|e| FrameRecord {
                index: e.frame_index,
                timestamp: e.timestamp,
                image_path: frames_dir.join(frame_filename(e.frame_index)),
            })
            .collect()
    }

    /// Indices dense from 0, names matching indices, timestamps strictly
    /// increasing and the frame count consistent.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.total_frames != self.frame_mapping.len() as u64 {
            return Err(PipelineError::Validation(format!(
                "{}: total_frames {} but {} entries",
                self.variant,
                self.total_frames,
                self.frame_mapping.len()
            )));
        }
        for (name, entry) in &self.frame_mapping {
            if *name != frame_filename(entry.frame_index) {
                return Err(PipelineError::Validation(format!(
                    "{}: {name} records frame index {}",
                    self.variant, entry.frame_index
                )));
            }
        }

        let entries = self.entries();
        let mut previous: Option<f64> = None;
        for (expected, entry) in entries.iter().enumerate() {
            if entry.frame_index != expected as u64 {
                return Err(PipelineError::Validation(format!(
                    "{}: frame indices not contiguous at {}",
                    self.variant, entry.frame_index
                )));
            }
            if !entry.timestamp.is_finite() || previous.is_some_and(|prev| entry.timestamp <= prev) {
                return Err(PipelineError::Validation(format!(
                    "{}: timestamp of frame {} is not strictly increasing",
                    self.variant, entry.frame_index
                )));
            }
            previous = Some(entry.timestamp);
        }
        Ok(())
    }
}
