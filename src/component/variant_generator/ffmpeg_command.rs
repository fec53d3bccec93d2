use super::variant::{Variant, VariantKind};
use crate::component::source_normalizer::{CANONICAL_CRF, INTRA_X264_ARGS};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Builds the encode of one variant from the canonical video.
///
/// Clips are cut on the canonical frame timestamps (`trim`) before the
/// duration-preserving `fps` resample, so the time span never depends on the
/// target rate.
pub struct VariantCommand {
    canonical_path: PathBuf,
    destination_path: PathBuf,
    variant: Variant,
    has_audio: bool,
}

impl VariantCommand {
    #[must_use]
    pub fn new(canonical_path: &Path, destination_path: &Path, variant: &Variant, has_audio: bool) -> Self {
        Self {
            canonical_path: canonical_path.to_path_buf(),
            destination_path: destination_path.to_path_buf(),
            variant: variant.clone(),
            has_audio,
        }
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    fn video_filter(&self) -> String {
        let resample = format!("fps={}:round=near", self.variant.fps);
        match &self.variant.kind {
            VariantKind::Full => resample,
            VariantKind::Clip {
                start_seconds,
                end_seconds,
                ..
            } => format!("trim=start={start_seconds:.6}:end={end_seconds:.6},setpts=PTS-STARTPTS,{resample}"),
        }
    }

    fn audio_filter(&self) -> Option<String> {
        match &self.variant.kind {
            VariantKind::Full => None,
            VariantKind::Clip {
                start_seconds,
                end_seconds,
                ..
            } => Some(format!(
                "atrim=start={start_seconds:.6}:end={end_seconds:.6},asetpts=PTS-STARTPTS"
            )),
        }
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new("ffmpeg");

        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]);
        cmd.arg("-i").arg(&self.canonical_path);
        cmd.args(["-map", "0:v:0"]);
        if self.has_audio {
            cmd.args(["-map", "0:a:0?"]);
        }
        cmd.args(["-sn", "-dn", "-map_metadata", "-1"]);
        cmd.arg("-vf").arg(self.video_filter());
        cmd.arg("-r").arg(self.variant.fps.to_string());
        cmd.args(["-fps_mode", "cfr"]);
        cmd.args(INTRA_X264_ARGS);
        cmd.arg("-crf").arg(CANONICAL_CRF.to_string());
        if self.has_audio {
            if let Some(filter) = self.audio_filter() {
                cmd.arg("-af").arg(filter);
            }
            cmd.args(["-c:a", "aac", "-b:a", "192k"]);
        } else {
            cmd.arg("-an");
        }
        cmd.args(["-movflags", "+faststart", "-f", "mp4"]);
        cmd.arg(&self.destination_path);

        cmd
    }
}
