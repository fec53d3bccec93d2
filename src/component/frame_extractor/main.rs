use super::frame_selector::{effective_fps, select_frames};
use super::timestamp_probe::probe_frame_timestamps;
use super::timestamp_table::{FrameRecord, FrameTimestampTable, TIMESTAMP_TABLE_FILE, frame_filename};
use crate::component::variant_generator::VariantVideo;
use crate::error::{PipelineError, PipelineResult};
use crate::tools::{discard_directory, ensure_directory_exists, partial_path_for, run_ffmpeg};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use walkdir::WalkDir;

const DECODED_PREFIX: &str = "decoded_";
const JPEG_QUALITY: &str = "2";

/// Extracted frames of one variant.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    pub frames_dir: PathBuf,
    pub variant_key: String,
    pub fps: f64,
    pub records: Vec<FrameRecord>,
}

impl FrameSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct FrameExtractor {
    shutdown_signal: Arc<AtomicBool>,
}

impl FrameExtractor {
    pub const fn new(shutdown_signal: Arc<AtomicBool>) -> Self {
        Self { shutdown_signal }
    }

    /// Extract still images and measured timestamps for `variant_video` into
    /// `frames_dir`. The directory is replaced only when extraction succeeds.
    pub fn extract(&self, variant_video: &VariantVideo, target_fps: f64, frames_dir: &Path) -> PipelineResult<FrameSet> {
        let key = &variant_video.variant.key;
        let staging = partial_path_for(frames_dir);
        ensure_directory_exists(&staging)?;

        let frames = match self
            .extract_into(variant_video, target_fps, &staging)
            .and_then(|frames| {
                replace_directory(&staging, frames_dir)?;
                Ok(frames)
            }) {
            Ok(frames) => frames,
            Err(e) => {
                warn!("Frame extraction for {key} failed: {e}");
                discard_directory(&staging);
                return Err(e);
            }
        };

        info!("Extracted {} frames for {key} into {}", frames.len(), frames_dir.display());
        let table = FrameTimestampTable::new(key, target_fps, &frames);
        Ok(FrameSet {
            frames_dir: frames_dir.to_path_buf(),
            variant_key: key.clone(),
            fps: target_fps,
            records: table.records(frames_dir),
        })
    }

    /// Load and check a previously extracted frame set without touching it.
    pub fn load_existing(&self, variant_video: &VariantVideo, frames_dir: &Path) -> PipelineResult<FrameSet> {
        let key = &variant_video.variant.key;
        let table = FrameTimestampTable::load(&frames_dir.join(TIMESTAMP_TABLE_FILE))?;
        table.validate()?;

        if table.variant != *key {
            return Err(PipelineError::Validation(format!(
                "frame table belongs to {}, expected {key}",
                table.variant
            )));
        }
        if (table.fps - variant_video.variant.fps).abs() > f64::EPSILON {
            return Err(PipelineError::Validation(format!(
                "{key}: frame table records {} fps, expected {}",
                table.fps, variant_video.variant.fps
            )));
        }
        check_frame_count(key, table.total_frames as usize, variant_video.duration_seconds, table.fps)?;

        let records = table.records(frames_dir);
        if let Some(missing) = records.iter().find(|r| !r.image_path.is_file()) {
            return Err(PipelineError::Validation(format!(
                "{key}: missing frame image {}",
                missing.image_path.display()
            )));
        }

        Ok(FrameSet {
            frames_dir: frames_dir.to_path_buf(),
            variant_key: key.clone(),
            fps: table.fps,
            records,
        })
    }

    fn extract_into(&self, variant_video: &VariantVideo, target_fps: f64, staging: &Path) -> PipelineResult<Vec<(u64, f64)>> {
        let key = &variant_video.variant.key;
        let step = format!("extract frames {key}");
        let decode_result = run_ffmpeg(
            &step,
            dump_frames_command(&variant_video.path, staging),
            &self.shutdown_signal,
        );
        match decode_result {
            Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
            Err(decode_error) => {
                let timestamps = probe_frame_timestamps(&variant_video.path);
                return Err(decode_failure(
                    &decode_error,
                    timestamps,
                    target_fps,
                    variant_video.fps,
                    &staged_decode_positions(staging),
                ));
            }
            Ok(()) => {}
        }

        let timestamps = probe_frame_timestamps(&variant_video.path)?;
        let effective = effective_fps(&timestamps).unwrap_or(variant_video.fps);
        let selected = select_frames(&timestamps, target_fps, effective);
        debug!(
            "{key}: {} decoded frames at {effective:.3} fps, {} selected for {target_fps} fps",
            timestamps.len(),
            selected.len()
        );

        let (extracted, missing) = partition_staged(&selected, &staged_decode_positions(staging));
        if !missing.is_empty() {
            return Err(PipelineError::Extraction {
                message: format!("{} decoded frames have no image", missing.len()),
                extracted,
                missing,
            });
        }

        check_frame_count(key, selected.len(), variant_video.duration_seconds, target_fps)?;

        let mut frames = Vec::with_capacity(selected.len());
        for (dense, &position) in selected.iter().enumerate() {
            let dense = dense as u64;
            fs::rename(
                staging.join(decoded_filename(position)),
                staging.join(frame_filename(dense)),
            )?;
            if let Some(ts) = timestamps[position] {
                frames.push((dense, ts));
            }
        }
        remove_unselected(staging);

        FrameTimestampTable::new(key, target_fps, &frames).save(&staging.join(TIMESTAMP_TABLE_FILE))?;
        Ok(frames)
    }
}

/// Split the dense indices of `selected` into those whose decoded image is
/// staged and those without one.
fn partition_staged(selected: &[usize], staged: &BTreeSet<usize>) -> (Vec<u64>, Vec<u64>) {
    (0..selected.len() as u64).partition(|&dense| staged.contains(&selected[dense as usize]))
}

/// Extraction report for a decode that stopped early.
///
/// With readable timestamps the staged images are matched against the frame
/// selection. Without them only the staged decode positions are known, so
/// those are reported as extracted and nothing as missing.
fn decode_failure(
    decode_error: &PipelineError,
    timestamps: PipelineResult<Vec<Option<f64>>>,
    target_fps: f64,
    fallback_fps: f64,
    staged: &BTreeSet<usize>,
) -> PipelineError {
    match timestamps {
        Ok(timestamps) => {
            let effective = effective_fps(&timestamps).unwrap_or(fallback_fps);
            let selected = select_frames(&timestamps, target_fps, effective);
            let (extracted, missing) = partition_staged(&selected, staged);
            PipelineError::Extraction {
                message: decode_error.to_string(),
                extracted,
                missing,
            }
        }
        Err(timestamp_error) => {
            warn!("Frame timestamps unavailable after decode failure: {timestamp_error}");
            PipelineError::Extraction {
                message: format!("{decode_error}; frame timestamps unavailable: {timestamp_error}"),
                extracted: staged.iter().map(|&position| position as u64).collect(),
                missing: Vec::new(),
            }
        }
    }
}

/// The extracted count must be `floor(duration * fps)` give or take one.
pub fn check_frame_count(key: &str, actual: usize, duration_seconds: f64, fps: f64) -> PipelineResult<()> {
    let expected = (duration_seconds * fps).floor() as i64;
    if (actual as i64 - expected).abs() > 1 {
        return Err(PipelineError::Validation(format!(
            "{key}: {actual} frames extracted, expected {expected} (+/-1) for {duration_seconds:.3}s at {fps} fps"
        )));
    }
    Ok(())
}

/// Dump every decoded frame, in decode order, numbered from 0.
fn dump_frames_command(video_path: &Path, staging: &Path) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]);
    cmd.arg("-i").arg(video_path);
    cmd.args([
        "-map", "0:v:0",
        "-an",
        "-fps_mode", "passthrough",
        "-q:v", JPEG_QUALITY,
        "-start_number", "0",
    ]);
    cmd.arg(staging.join(format!("{DECODED_PREFIX}%06d.jpg")));
    cmd
}

fn decoded_filename(position: usize) -> String {
    format!("{DECODED_PREFIX}{position:06}.jpg")
}

/// Decode positions of the images ffmpeg wrote into `staging`.
fn staged_decode_positions(staging: &Path) -> BTreeSet<usize> {
    WalkDir::new(staging)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()?
                .strip_prefix(DECODED_PREFIX)?
                .strip_suffix(".jpg")?
                .parse()
                .ok()
        })
        .collect()
}

fn remove_unselected(staging: &Path) {
    for entry in WalkDir::new(staging)
        .max_depth(1)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(DECODED_PREFIX))
    {
        if let Err(e) = fs::remove_file(entry.path()) {
            warn!("Failed to remove {}: {e}", entry.path().display());
        }
    }
}

fn replace_directory(staging: &Path, frames_dir: &Path) -> PipelineResult<()> {
    if frames_dir.exists() {
        fs::remove_dir_all(frames_dir)?;
    }
    fs::rename(staging, frames_dir)?;
    Ok(())
}
