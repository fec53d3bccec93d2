use anyhow::{Context, Result, bail};
use log::debug;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Video stream duration, falling back to the container duration
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    /// Nominal stream rate (`r_frame_rate`)
    pub frame_rate: f64,
    /// Average rate over the stream (`avg_frame_rate`), when reported
    pub avg_frame_rate: Option<f64>,
    pub codec_name: Option<String>,
    pub has_audio: bool,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Probe a media file with ffprobe.
pub fn get_video_info(path: &Path) -> Result<VideoInfo> {
    let mut command = Command::new("ffprobe");
    command
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path);
    debug!("probe: {command:?}");

    let output = command
        .output()
        .with_context(|| format!("Failed to run ffprobe: {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe failed for {}: {stderr}", path.display());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_probe_output(&stdout).with_context(|| format!("Unusable ffprobe output for {}", path.display()))
}

fn parse_probe_output(stdout: &str) -> Result<VideoInfo> {
    let probe: FfprobeOutput =
        serde_json::from_str(stdout).context("Failed to parse ffprobe output")?;

    let streams = probe.streams.as_deref().unwrap_or_default();
    let video_stream = streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| anyhow::anyhow!("No video stream found"))?;
    let has_audio = streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let width = video_stream
        .width
        .ok_or_else(|| anyhow::anyhow!("Missing video width"))?;
    let height = video_stream
        .height
        .ok_or_else(|| anyhow::anyhow!("Missing video height"))?;

    // Prefer the video stream duration: audio can run past the last frame
    let duration_seconds = video_stream
        .duration
        .as_ref()
        .or_else(|| probe.format.as_ref().and_then(|f| f.duration.as_ref()))
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| anyhow::anyhow!("Missing duration"))?;

    let frame_rate = video_stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .ok_or_else(|| anyhow::anyhow!("Missing frame rate"))?;
    let avg_frame_rate = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate);

    Ok(VideoInfo {
        duration_seconds,
        width,
        height,
        frame_rate,
        avg_frame_rate,
        codec_name: video_stream.codec_name.clone(),
        has_audio,
    })
}

/// Parse a frame rate string such as `30/1` or `30000/1001`.
#[must_use]
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 && num > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok().filter(|r: &f64| *r > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        let cases = [
            ("60/1", Some(60.0)),
            ("30000/1001", Some(29.970_03)),
            ("25", Some(25.0)),
            ("23.976", Some(23.976)),
            ("30/0", None),
            ("0/0", None),
            ("-30/1", None),
            ("N/A", None),
        ];
        for (raw, expected) in cases {
            match (parse_frame_rate(raw), expected) {
                (Some(rate), Some(want)) => assert!((rate - want).abs() < 1e-4, "{raw}: {rate}"),
                (None, None) => {}
                (got, want) => panic!("{raw}: got {got:?}, expected {want:?}"),
            }
        }
    }

    #[test]
    fn test_parse_probe_output_prefers_stream_duration() {
        let json = r#"{
            "streams": [
                { "codec_type": "video", "codec_name": "h264", "width": 640, "height": 360,
                  "r_frame_rate": "60/1", "avg_frame_rate": "60/1", "duration": "7.750000" },
                { "codec_type": "audio", "codec_name": "aac", "duration": "7.800000" }
            ],
            "format": { "duration": "7.800000" }
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration_seconds - 7.75).abs() < 1e-9);
        assert_eq!((info.width, info.height), (640, 360));
        assert!((info.frame_rate - 60.0).abs() < 1e-9);
        assert!(info.has_audio);
        assert_eq!(info.codec_name.as_deref(), Some("h264"));
    }

    #[test]
    fn test_parse_probe_output_falls_back_to_format_duration() {
        let json = r#"{
            "streams": [ { "codec_type": "video", "width": 320, "height": 240, "r_frame_rate": "30/1" } ],
            "format": { "duration": "6.000000" }
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration_seconds - 6.0).abs() < 1e-9);
        assert!(!info.has_audio);
        assert_eq!(info.avg_frame_rate, None);
    }

    #[test]
    fn test_parse_probe_output_without_video() {
        let json = r#"{ "streams": [ { "codec_type": "audio" } ], "format": { "duration": "1.0" } }"#;
        assert!(parse_probe_output(json).is_err());
    }
}
