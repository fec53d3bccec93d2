use thiserror::Error;

/// Frames closer than this to an integer are treated as that integer when
/// deriving a frame count from a duration.
const FRAME_COUNT_EPSILON: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("Frame index must be a finite, non-negative number, got {0}")]
    InvalidFrame(f64),

    #[error("{name} must be finite and positive, got {value}")]
    InvalidFps { name: &'static str, value: f64 },

    #[error("Timeline duration must be finite and positive, got {0}")]
    InvalidDuration(f64),
}

/// Upper bound of the timeline a mapped index lands on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineBound {
    /// Known duration in seconds; the last frame is `ceil(duration * fps) - 1`.
    Duration(f64),
    /// Caller-supplied last valid frame index.
    MaxFrame(u64),
}

impl TimelineBound {
    /// Last valid frame index on a timeline running at `fps`.
    pub fn max_frame(self, fps: f64) -> Result<u64, MappingError> {
        match self {
            Self::MaxFrame(max) => Ok(max),
            Self::Duration(duration) => {
                if !duration.is_finite() || duration <= 0.0 {
                    return Err(MappingError::InvalidDuration(duration));
                }
                check_fps("fps", fps)?;
                Ok(frame_count(duration, fps).saturating_sub(1))
            }
        }
    }
}

/// Parameters relating one variant to the canonical timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineMapping {
    pub canonical_fps: f64,
    pub variant_fps: f64,
    /// Canonical frame at which the variant's frame 0 sits (0 for full variants)
    pub clip_start_canonical_frame: u64,
}

impl TimelineMapping {
    #[must_use]
    pub const fn new(canonical_fps: f64, variant_fps: f64, clip_start_canonical_frame: u64) -> Self {
        Self {
            canonical_fps,
            variant_fps,
            clip_start_canonical_frame,
        }
    }

    pub fn to_variant(&self, canonical_frame: f64, bound: TimelineBound) -> Result<u64, MappingError> {
        variant_frame(
            canonical_frame,
            self.canonical_fps,
            self.variant_fps,
            self.clip_start_canonical_frame,
            bound,
        )
    }

    pub fn to_canonical(&self, variant_frame_index: f64, bound: TimelineBound) -> Result<u64, MappingError> {
        canonical_frame(
            variant_frame_index,
            self.canonical_fps,
            self.variant_fps,
            self.clip_start_canonical_frame,
            bound,
        )
    }
}

/// Map a canonical frame index onto a variant's local frame index.
///
/// `round(((canonical_frame - clip_start) / canonical_fps) * variant_fps)`,
/// clamped to `[0, max_frame]` of the variant timeline given by `bound`.
pub fn variant_frame(
    canonical_frame: f64,
    canonical_fps: f64,
    variant_fps: f64,
    clip_start_canonical_frame: u64,
    bound: TimelineBound,
) -> Result<u64, MappingError> {
    check_frame(canonical_frame)?;
    check_fps("canonical_fps", canonical_fps)?;
    check_fps("variant_fps", variant_fps)?;
    let max_frame = bound.max_frame(variant_fps)?;

    let offset = canonical_frame - clip_start_canonical_frame as f64;
    let mapped = ((offset / canonical_fps) * variant_fps).round();
    Ok(clamp_frame(mapped, max_frame))
}

/// Map a variant's local frame index back onto the canonical timeline.
///
/// `round((variant_frame / variant_fps) * canonical_fps) + clip_start`,
/// clamped to `[0, max_frame]` of the canonical timeline given by `bound`.
pub fn canonical_frame(
    variant_frame_index: f64,
    canonical_fps: f64,
    variant_fps: f64,
    clip_start_canonical_frame: u64,
    bound: TimelineBound,
) -> Result<u64, MappingError> {
    check_frame(variant_frame_index)?;
    check_fps("canonical_fps", canonical_fps)?;
    check_fps("variant_fps", variant_fps)?;
    let max_frame = bound.max_frame(canonical_fps)?;

    let mapped = ((variant_frame_index / variant_fps) * canonical_fps).round()
        + clip_start_canonical_frame as f64;
    Ok(clamp_frame(mapped, max_frame))
}

/// Canonical frame at which a clip starting at `clip_start_seconds` begins.
pub fn clip_start_canonical_frame(clip_start_seconds: f64, canonical_fps: f64) -> Result<u64, MappingError> {
    if !clip_start_seconds.is_finite() || clip_start_seconds < 0.0 {
        return Err(MappingError::InvalidFrame(clip_start_seconds));
    }
    check_fps("canonical_fps", canonical_fps)?;
    Ok((clip_start_seconds * canonical_fps).round() as u64)
}

/// Number of frames a timeline of `duration` seconds holds at `fps`.
#[must_use]
pub fn frame_count(duration: f64, fps: f64) -> u64 {
    let frames = (duration * fps - FRAME_COUNT_EPSILON).ceil();
    if frames.is_finite() && frames > 0.0 {
        frames as u64
    } else {
        0
    }
}

fn check_frame(frame: f64) -> Result<(), MappingError> {
    if frame.is_finite() && frame >= 0.0 {
        Ok(())
    } else {
        Err(MappingError::InvalidFrame(frame))
    }
}

fn check_fps(name: &'static str, value: f64) -> Result<(), MappingError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MappingError::InvalidFps { name, value })
    }
}

fn clamp_frame(mapped: f64, max_frame: u64) -> u64 {
    if mapped <= 0.0 {
        0
    } else {
        (mapped as u64).min(max_frame)
    }
}
