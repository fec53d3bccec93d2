use std::path::{Path, PathBuf};
use std::process::Command;

/// x264 quality for the canonical encode
pub const CANONICAL_CRF: u32 = 18;

/// x264 settings that make every frame a keyframe.
pub const INTRA_X264_ARGS: [&str; 16] = [
    "-c:v", "libx264",
    "-preset", "medium",
    "-pix_fmt", "yuv420p",
    "-g", "1",
    "-keyint_min", "1",
    "-sc_threshold", "0",
    "-bf", "0",
    "-x264-params", "keyint=1:min-keyint=1:scenecut=0",
];

/// Builds the all-intra canonical encode.
pub struct NormalizeCommand {
    source_path: PathBuf,
    destination_path: PathBuf,
    resample_fps: Option<f64>,
    has_audio: bool,
}

impl NormalizeCommand {
    #[must_use]
    pub fn new(source_path: &Path, destination_path: &Path) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            destination_path: destination_path.to_path_buf(),
            resample_fps: None,
            has_audio: false,
        }
    }

    /// Resample onto a fixed frame grid instead of passing source timing through.
    #[must_use]
    pub const fn with_resample(mut self, fps: Option<f64>) -> Self {
        self.resample_fps = fps;
        self
    }

    #[must_use]
    pub const fn with_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    fn video_filter(&self) -> String {
        let mut filters = vec!["scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string(), "setsar=1".to_string()];
        if let Some(fps) = self.resample_fps {
            filters.push(format!("fps={fps}:round=near"));
        }
        filters.join(",")
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new("ffmpeg");

        cmd.args([
            "-hide_banner",
            "-nostdin",
            "-loglevel", "error",
            "-y",
            "-fflags", "+genpts",
        ]);
        cmd.arg("-i").arg(&self.source_path);
        cmd.args(["-map", "0:v:0"]);
        if self.has_audio {
            cmd.args(["-map", "0:a:0?"]);
        }
        cmd.args([
            "-sn", "-dn",
            "-map_metadata", "-1",
            "-map_chapters", "-1",
            "-avoid_negative_ts", "make_zero",
        ]);
        cmd.arg("-vf").arg(self.video_filter());
        if self.resample_fps.is_none() {
            cmd.args(["-fps_mode", "passthrough"]);
        }
        cmd.args(INTRA_X264_ARGS);
        cmd.arg("-crf").arg(CANONICAL_CRF.to_string());
        if self.has_audio {
            cmd.args(["-c:a", "aac", "-b:a", "192k"]);
        } else {
            cmd.arg("-an");
        }
        cmd.args(["-movflags", "+faststart", "-f", "mp4"]);
        cmd.arg(&self.destination_path);

        cmd
    }
}

/// ffprobe call listing the flags of every video packet, one per line.
#[must_use]
pub fn packet_flags_command(path: &Path) -> Command {
    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v", "error",
        "-select_streams", "v:0",
        "-show_entries", "packet=flags",
        "-of", "csv=p=0",
    ]);
    cmd.arg(path);
    cmd
}
