use crate::error::{PipelineError, PipelineResult};
use log::debug;
use std::path::Path;
use std::process::Command;

/// Decoder-reported presentation time of every decoded video frame, in
/// decode order. `None` where ffprobe reports `N/A`.
pub fn probe_frame_timestamps(path: &Path) -> PipelineResult<Vec<Option<f64>>> {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v", "error",
        "-select_streams", "v:0",
        "-show_entries", "frame=best_effort_timestamp_time",
        "-of", "csv=p=0",
    ]);
    cmd.arg(path);
    debug!("timestamp probe: {cmd:?}");

    let output = cmd
        .output()
        .map_err(|e| PipelineError::Probe(format!("failed to run ffprobe: {e}")))?;
    if !output.status.success() {
        return Err(PipelineError::Probe(format!(
            "frame timestamp probe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(parse_frame_timestamps(&String::from_utf8_lossy(&output.stdout)))
}

#[must_use]
pub fn parse_frame_timestamps(csv: &str) -> Vec<Option<f64>> {
    csv.lines()
        .map(|line| line.trim().trim_end_matches(','))
        .filter(|line| !line.is_empty())
        .map(|value| value.parse::<f64>().ok().filter(|ts| ts.is_finite()))
        .collect()
}
