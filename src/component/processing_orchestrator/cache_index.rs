//! `{video_id}_processing_info.json`: what was built, from what.
//!
//! The file is the cache index for skip decisions and the source of truth for
//! the serving-layer metadata accessors.

use crate::component::source_normalizer::CanonicalVideo;
use crate::component::variant_generator::VariantKind;
use crate::error::{PipelineError, PipelineResult};
use crate::tools::{calculate_file_hash, commit_partial, partial_path_for};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Identity of a source file: size and mtime for a quick check, plus content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFingerprint {
    pub size: u64,
    pub modified_unix_ms: u64,
    pub blake3: String,
}

impl SourceFingerprint {
    /// Fingerprint `path`, reusing `previous` when size and mtime are unchanged.
    pub fn compute(path: &Path, previous: Option<&Self>) -> PipelineResult<Self> {
        let (size, modified_unix_ms) = stat(path)?;
        if let Some(previous) = previous
            && previous.size == size
            && previous.modified_unix_ms == modified_unix_ms
        {
            return Ok(previous.clone());
        }

        let blake3 = calculate_file_hash(path).map_err(|e| PipelineError::SourceMissing {
            path: path.to_path_buf(),
            reason: format!("{e:#}"),
        })?;
        Ok(Self {
            size,
            modified_unix_ms,
            blake3,
        })
    }

    /// Same content, regardless of a touched mtime.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.size == other.size && self.blake3 == other.blake3
    }
}

fn stat(path: &Path) -> PipelineResult<(u64, u64)> {
    let missing = |reason: String| PipelineError::SourceMissing {
        path: path.to_path_buf(),
        reason,
    };
    let metadata = fs::metadata(path).map_err(|e| missing(e.to_string()))?;
    if !metadata.is_file() {
        return Err(missing("not a file".to_string()));
    }
    let modified_unix_ms = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis() as u64);
    Ok((metadata.len(), modified_unix_ms))
}

/// One successfully built variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub kind: VariantKind,
    pub fps: f64,
    pub clip_start_canonical_frame: u64,
    pub duration_seconds: f64,
    pub frame_count: u64,
    /// File name inside the video directory
    pub video_file: String,
    /// Path of the frame directory relative to the video directory
    pub frames_dir: String,
    pub descriptor_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub video_id: String,
    pub source_video: PathBuf,
    pub source_fingerprint: SourceFingerprint,
    pub detected_source_fps: f64,
    pub canonical_fps: f64,
    pub canonical: CanonicalVideo,
    #[serde(default)]
    pub variants: BTreeMap<String, VariantRecord>,
    /// Variant key to the error of its last attempt
    #[serde(default)]
    pub failed_variants: BTreeMap<String, String>,
}

impl ProcessingInfo {
    /// `Ok(None)` when the video has never been processed.
    pub fn load(path: &Path) -> PipelineResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| PipelineError::Validation(format!("unreadable {}: {e}", path.display())))
    }

    /// Write through a partial file so readers never see half a document.
    pub fn save(&self, path: &Path) -> PipelineResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Validation(format!("cannot serialize processing info: {e}")))?;
        let partial = partial_path_for(path);
        fs::write(&partial, content)?;
        commit_partial(&partial, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_info() -> ProcessingInfo {
        let mut variants = BTreeMap::new();
        variants.insert(
            "clip_001_30".to_string(),
            VariantRecord {
                kind: VariantKind::Clip {
                    name: "clip_001".to_string(),
                    label: Some("Warmup".to_string()),
                    start_seconds: 2.0,
                    end_seconds: 8.0,
                },
                fps: 30.0,
                clip_start_canonical_frame: 120,
                duration_seconds: 6.0,
                frame_count: 180,
                video_file: "cam__clip_001_30.mp4".to_string(),
                frames_dir: "frames/clip_001_30".to_string(),
                descriptor_fingerprint: "abc".to_string(),
            },
        );
        ProcessingInfo {
            video_id: "cam".to_string(),
            source_video: PathBuf::from("media/cam.mov"),
            source_fingerprint: SourceFingerprint {
                size: 10,
                modified_unix_ms: 20,
                blake3: "ff".to_string(),
            },
            detected_source_fps: 59.94,
            canonical_fps: 60.0,
            canonical: CanonicalVideo {
                path: PathBuf::from("out/cam/cam__canonical.mp4"),
                duration_seconds: 7.75,
                fps: 60.0,
                detected_source_fps: 59.94,
                width: 640,
                height: 360,
                has_audio: false,
            },
            variants,
            failed_variants: BTreeMap::new(),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cam_processing_info.json");
        assert_eq!(ProcessingInfo::load(&path).unwrap(), None);

        let info = sample_info();
        info.save(&path).unwrap();

        assert_eq!(ProcessingInfo::load(&path).unwrap(), Some(info));
        // Only the committed file is left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_fingerprint_reuses_previous_when_unchanged() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("cam.mov");
        fs::write(&source, b"frames").unwrap();

        let first = SourceFingerprint::compute(&source, None).unwrap();
        assert_eq!(first.size, 6);
        assert_eq!(first.blake3.len(), 64);

        // A stale hash is trusted while size and mtime are unchanged
        let mut cached = first.clone();
        cached.blake3 = "cached".to_string();
        let reused = SourceFingerprint::compute(&source, Some(&cached)).unwrap();
        assert_eq!(reused.blake3, "cached");

        cached.size = 99;
        let recomputed = SourceFingerprint::compute(&source, Some(&cached)).unwrap();
        assert_eq!(recomputed, first);
        assert!(recomputed.same_content(&first));
    }

    #[test]
    fn test_fingerprint_of_missing_source() {
        let dir = tempdir().unwrap();
        let result = SourceFingerprint::compute(&dir.path().join("gone.mov"), None);
        assert!(matches!(result, Err(PipelineError::SourceMissing { .. })));
    }
}
