use super::ffmpeg_command::{NormalizeCommand, packet_flags_command};
use crate::config::VideoConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::tools::{
    VideoInfo, commit_partial, discard_file, ensure_directory_exists, get_video_info,
    partial_path_for, retry_once, run_ffmpeg, validate_file_exists,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Source rates closer than this to the declared canonical rate are not resampled.
pub const FPS_MATCH_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalVideo {
    pub path: PathBuf,
    pub duration_seconds: f64,
    /// Frame grid of the canonical timeline (the declared canonical FPS)
    pub fps: f64,
    /// Rate ffprobe reported for the source
    pub detected_source_fps: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
}

pub struct SourceNormalizer {
    shutdown_signal: Arc<AtomicBool>,
    duration_tolerance: f64,
}

impl SourceNormalizer {
    pub const fn new(shutdown_signal: Arc<AtomicBool>, duration_tolerance: f64) -> Self {
        Self {
            shutdown_signal,
            duration_tolerance,
        }
    }

    /// Re-encode `video.source_video` into an all-intra canonical file at
    /// `canonical_path`. Encoder and validation failures are retried once.
    pub fn normalize(&self, video: &VideoConfig, canonical_path: &Path) -> PipelineResult<CanonicalVideo> {
        let source_info = probe_source(&video.source_video)?;
        let resample_fps = resample_target(source_info.frame_rate, video.canonical_fps);

        debug!(
            "[{}] Source codec {}, {}x{}, {:.3}s",
            video.id,
            source_info.codec_name.as_deref().unwrap_or("unknown"),
            source_info.width,
            source_info.height,
            source_info.duration_seconds
        );
        if let Some(avg) = source_info.avg_frame_rate
            && (avg - source_info.frame_rate).abs() > FPS_MATCH_TOLERANCE
        {
            warn!(
                "[{}] Source looks variable frame rate (nominal {:.3}, average {avg:.3} fps)",
                video.id, source_info.frame_rate
            );
        }

        match resample_fps {
            Some(fps) => info!(
                "[{}] Source runs at {:.3} fps, resampling to declared {fps} fps",
                video.id, source_info.frame_rate
            ),
            None => debug!(
                "[{}] Source rate {:.3} fps matches declared {} fps",
                video.id, source_info.frame_rate, video.canonical_fps
            ),
        }

        if let Some(parent) = canonical_path.parent() {
            ensure_directory_exists(parent)?;
        }

        let step = format!("normalize {}", video.id);
        let output_info = retry_once(&step, || {
            self.encode_once(&step, video, &source_info, resample_fps, canonical_path)
        })?;

        info!(
            "[{}] Canonical video ready: {} ({:.3}s, {}x{})",
            video.id,
            canonical_path.display(),
            output_info.duration_seconds,
            output_info.width,
            output_info.height
        );

        Ok(CanonicalVideo {
            path: canonical_path.to_path_buf(),
            duration_seconds: output_info.duration_seconds,
            fps: video.canonical_fps,
            detected_source_fps: source_info.frame_rate,
            width: output_info.width,
            height: output_info.height,
            has_audio: output_info.has_audio,
        })
    }

    /// Describe an existing canonical file without re-encoding it.
    pub fn inspect(
        &self,
        video: &VideoConfig,
        canonical_path: &Path,
        detected_source_fps: f64,
    ) -> PipelineResult<CanonicalVideo> {
        let info = probe(canonical_path)?;
        Ok(CanonicalVideo {
            path: canonical_path.to_path_buf(),
            duration_seconds: info.duration_seconds,
            fps: video.canonical_fps,
            detected_source_fps,
            width: info.width,
            height: info.height,
            has_audio: info.has_audio,
        })
    }

    fn encode_once(
        &self,
        step: &str,
        video: &VideoConfig,
        source_info: &VideoInfo,
        resample_fps: Option<f64>,
        canonical_path: &Path,
    ) -> PipelineResult<VideoInfo> {
        let partial_path = partial_path_for(canonical_path);
        let command = NormalizeCommand::new(&video.source_video, &partial_path)
            .with_resample(resample_fps)
            .with_audio(source_info.has_audio);

        info!("[{}] Encoding canonical video", video.id);
        let result = run_ffmpeg(step, command.build_command(), &self.shutdown_signal)
            .and_then(|()| self.validate_output(command.destination_path(), source_info))
            .and_then(|info| {
                commit_partial(command.destination_path(), canonical_path)?;
                Ok(info)
            });

        if let Err(e) = &result {
            warn!("[{}] Canonical encode rejected: {e}", video.id);
            discard_file(&partial_path);
        }
        result
    }

    fn validate_output(&self, output_path: &Path, source_info: &VideoInfo) -> PipelineResult<VideoInfo> {
        let info = probe(output_path)?;

        let drift = (info.duration_seconds - source_info.duration_seconds).abs();
        if drift > self.duration_tolerance {
            return Err(PipelineError::Validation(format!(
                "canonical duration {:.3}s differs from source {:.3}s by {drift:.3}s (tolerance {:.3}s)",
                info.duration_seconds, source_info.duration_seconds, self.duration_tolerance
            )));
        }

        verify_all_intra(output_path)?;
        Ok(info)
    }
}

/// Declared rate to resample to, or `None` when the source already matches.
#[must_use]
pub fn resample_target(detected_fps: f64, declared_fps: f64) -> Option<f64> {
    ((detected_fps - declared_fps).abs() > FPS_MATCH_TOLERANCE).then_some(declared_fps)
}

fn probe_source(path: &Path) -> PipelineResult<VideoInfo> {
    let missing = |reason: String| PipelineError::SourceMissing {
        path: path.to_path_buf(),
        reason,
    };

    validate_file_exists(path).map_err(|e| missing(e.to_string()))?;
    File::open(path).map_err(|e| missing(e.to_string()))?;
    get_video_info(path).map_err(|e| missing(format!("{e:#}")))
}

fn probe(path: &Path) -> PipelineResult<VideoInfo> {
    get_video_info(path).map_err(|e| PipelineError::Probe(format!("{e:#}")))
}

fn verify_all_intra(path: &Path) -> PipelineResult<()> {
    let mut command = packet_flags_command(path);
    debug!("packet probe: {command:?}");
    let output = command
        .output()
        .map_err(|e| PipelineError::Probe(format!("failed to run ffprobe: {e}")))?;
    if !output.status.success() {
        return Err(PipelineError::Probe(format!(
            "packet probe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let (total, non_key) = count_non_keyframe_packets(&String::from_utf8_lossy(&output.stdout));
    if total == 0 {
        return Err(PipelineError::Validation(format!(
            "{} contains no video packets",
            path.display()
        )));
    }
    if non_key > 0 {
        return Err(PipelineError::Validation(format!(
            "{non_key} of {total} video packets are not keyframes"
        )));
    }
    Ok(())
}

/// Count `(packets, packets without the K flag)` in ffprobe csv flag output.
#[must_use]
pub fn count_non_keyframe_packets(csv: &str) -> (usize, usize) {
    csv.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold((0, 0), |(total, non_key), flags| {
            (total + 1, non_key + usize::from(!flags.starts_with('K')))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_count_non_keyframe_packets() {
        assert_eq!(count_non_keyframe_packets("K__\nK__\nK_\n"), (3, 0));
        assert_eq!(count_non_keyframe_packets("K__\n___\nK__\n__D\n"), (4, 2));
        assert_eq!(count_non_keyframe_packets("\n\n"), (0, 0));
    }

    #[test]
    fn test_resample_target() {
        assert_eq!(resample_target(60.0, 60.0), None);
        assert_eq!(resample_target(59.995, 60.0), None);
        assert_eq!(resample_target(29.97, 30.0), Some(30.0));
        assert_eq!(resample_target(25.0, 60.0), Some(60.0));
    }

    #[test]
    fn test_missing_source_is_source_missing() {
        let dir = tempdir().unwrap();
        let normalizer = SourceNormalizer::new(Arc::new(AtomicBool::new(false)), 0.05);
        let video = VideoConfig {
            id: "cam".to_string(),
            source_video: dir.path().join("absent.mp4"),
            canonical_fps: 60.0,
            fps_variants: vec![30.0],
            clips: Vec::new(),
        };

        let result = normalizer.normalize(&video, &dir.path().join("cam").join("cam__canonical.mp4"));

        assert!(matches!(result, Err(PipelineError::SourceMissing { .. })));
        // No artifact or output directory is created for a missing source
        assert!(!dir.path().join("cam").exists());
    }
}
