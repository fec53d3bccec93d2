use crate::error::{PipelineError, PipelineResult};
use regex::Regex;
use std::sync::LazyLock;

static TIMECODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:(\d+):)?(\d+):)?(\d+(?:\.\d+)?)$").expect("Invalid timecode regex")
});

/// Parse a canonical-timeline timecode into seconds.
///
/// Accepts `SS[.f]`, `MM:SS[.f]` and `HH:MM:SS[.f]`. The fractional part is a
/// plain decimal fraction of a second.
pub fn parse_timecode(raw: &str) -> PipelineResult<f64> {
    let trimmed = raw.trim();
    let caps = TIMECODE_PATTERN
        .captures(trimmed)
        .ok_or_else(|| PipelineError::Config(format!("Invalid timecode '{raw}'")))?;

    let hours = caps
        .get(1)
        .map_or(Ok(0.0), |m| m.as_str().parse::<f64>())
        .map_err(|e| PipelineError::Config(format!("Invalid hours in '{raw}': {e}")))?;
    let minutes = caps
        .get(2)
        .map_or(Ok(0.0), |m| m.as_str().parse::<f64>())
        .map_err(|e| PipelineError::Config(format!("Invalid minutes in '{raw}': {e}")))?;
    let seconds = caps
        .get(3)
        .map_or(Ok(0.0), |m| m.as_str().parse::<f64>())
        .map_err(|e| PipelineError::Config(format!("Invalid seconds in '{raw}': {e}")))?;

    // MM:SS and HH:MM:SS forms keep their lower fields below 60
    if caps.get(2).is_some() && seconds >= 60.0 {
        return Err(PipelineError::Config(format!(
            "Seconds out of range in timecode '{raw}'"
        )));
    }
    if caps.get(1).is_some() && minutes >= 60.0 {
        return Err(PipelineError::Config(format!(
            "Minutes out of range in timecode '{raw}'"
        )));
    }

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}
