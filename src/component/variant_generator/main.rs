use super::ffmpeg_command::VariantCommand;
use super::variant::{Variant, VariantKind};
use crate::component::source_normalizer::CanonicalVideo;
use crate::error::{PipelineError, PipelineResult};
use crate::tools::{
    VideoInfo, commit_partial, discard_file, ensure_directory_exists, get_video_info,
    partial_path_for, retry_once, run_ffmpeg,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Stream rate must match the requested rate this closely
pub const FPS_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantVideo {
    pub path: PathBuf,
    pub variant: Variant,
    pub duration_seconds: f64,
    /// Rate reported by the encoded stream
    pub fps: f64,
}

pub struct VariantGenerator {
    shutdown_signal: Arc<AtomicBool>,
    duration_tolerance: f64,
}

impl VariantGenerator {
    pub const fn new(shutdown_signal: Arc<AtomicBool>, duration_tolerance: f64) -> Self {
        Self {
            shutdown_signal,
            duration_tolerance,
        }
    }

    /// Encode `variant` from the canonical video into `variant_path`.
    pub fn generate(
        &self,
        canonical: &CanonicalVideo,
        variant: &Variant,
        variant_path: &Path,
    ) -> PipelineResult<VariantVideo> {
        check_clip_range(variant, canonical.duration_seconds, self.duration_tolerance)?;

        if let Some(parent) = variant_path.parent() {
            ensure_directory_exists(parent)?;
        }

        let step = format!("variant {}", variant.key);
        let video = retry_once(&step, || self.encode_once(&step, canonical, variant, variant_path))?;

        info!(
            "Variant {} ready: {} ({:.3}s at {} fps)",
            variant.key,
            variant_path.display(),
            video.duration_seconds,
            video.fps
        );
        Ok(video)
    }

    /// Re-probe an existing variant file against its descriptor.
    pub fn validate_existing(
        &self,
        canonical: &CanonicalVideo,
        variant: &Variant,
        variant_path: &Path,
    ) -> PipelineResult<VariantVideo> {
        check_clip_range(variant, canonical.duration_seconds, self.duration_tolerance)?;
        let info = get_video_info(variant_path).map_err(|e| PipelineError::Probe(format!("{e:#}")))?;
        validate_variant_info(
            &info,
            variant.expected_duration(canonical.duration_seconds),
            variant.fps,
            self.duration_tolerance,
        )?;
        Ok(VariantVideo {
            path: variant_path.to_path_buf(),
            variant: variant.clone(),
            duration_seconds: info.duration_seconds,
            fps: info.frame_rate,
        })
    }

    fn encode_once(
        &self,
        step: &str,
        canonical: &CanonicalVideo,
        variant: &Variant,
        variant_path: &Path,
    ) -> PipelineResult<VariantVideo> {
        let partial_path = partial_path_for(variant_path);
        let command = VariantCommand::new(&canonical.path, &partial_path, variant, canonical.has_audio);

        info!("Encoding variant {} at {} fps", variant.key, variant.fps);
        let result = run_ffmpeg(step, command.build_command(), &self.shutdown_signal)
            .and_then(|()| get_video_info(&partial_path).map_err(|e| PipelineError::Probe(format!("{e:#}"))))
            .and_then(|info| {
                validate_variant_info(
                    &info,
                    variant.expected_duration(canonical.duration_seconds),
                    variant.fps,
                    self.duration_tolerance,
                )?;
                commit_partial(&partial_path, variant_path)?;
                Ok(VariantVideo {
                    path: variant_path.to_path_buf(),
                    variant: variant.clone(),
                    duration_seconds: info.duration_seconds,
                    fps: info.frame_rate,
                })
            });

        if let Err(e) = &result {
            warn!("Variant {} rejected: {e}", variant.key);
            discard_file(command.destination_path());
        }
        result
    }
}

/// Allowed duration drift for a variant: the base tolerance, widened to one
/// frame period for low frame rates.
#[must_use]
pub fn duration_tolerance(base_tolerance: f64, fps: f64) -> f64 {
    base_tolerance.max(1.0 / fps)
}

/// Check probed stream properties against the variant's requested span and rate.
pub fn validate_variant_info(
    info: &VideoInfo,
    expected_duration: f64,
    fps: f64,
    base_tolerance: f64,
) -> PipelineResult<()> {
    let tolerance = duration_tolerance(base_tolerance, fps);
    let drift = (info.duration_seconds - expected_duration).abs();
    if drift > tolerance {
        return Err(PipelineError::Validation(format!(
            "duration {:.3}s differs from expected {expected_duration:.3}s by {drift:.3}s (tolerance {tolerance:.3}s)",
            info.duration_seconds
        )));
    }
    if (info.frame_rate - fps).abs() > FPS_TOLERANCE {
        return Err(PipelineError::Validation(format!(
            "stream runs at {:.4} fps, expected {fps}",
            info.frame_rate
        )));
    }
    Ok(())
}

/// Clips must lie inside the canonical timeline.
fn check_clip_range(variant: &Variant, canonical_duration: f64, tolerance: f64) -> PipelineResult<()> {
    if let VariantKind::Clip {
        name, end_seconds, ..
    } = &variant.kind
        && *end_seconds > canonical_duration + tolerance
    {
        return Err(PipelineError::Config(format!(
            "clip '{name}' ends at {end_seconds:.3}s, past the canonical duration {canonical_duration:.3}s"
        )));
    }
    Ok(())
}
