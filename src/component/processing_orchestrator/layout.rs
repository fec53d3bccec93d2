use std::path::{Path, PathBuf};

const FRAMES_DIR: &str = "frames";

/// Artifact paths of one video under the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    video_id: String,
    video_dir: PathBuf,
}

impl OutputLayout {
    #[must_use]
    pub fn new(output_root: &Path, video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            video_dir: output_root.join(video_id),
        }
    }

    #[must_use]
    pub fn video_dir(&self) -> &Path {
        &self.video_dir
    }

    #[must_use]
    pub fn canonical_path(&self) -> PathBuf {
        self.video_dir.join(format!("{}__canonical.mp4", self.video_id))
    }

    #[must_use]
    pub fn variant_path(&self, variant_key: &str) -> PathBuf {
        self.video_dir.join(format!("{}__{variant_key}.mp4", self.video_id))
    }

    #[must_use]
    pub fn frames_dir(&self, variant_key: &str) -> PathBuf {
        self.video_dir.join(FRAMES_DIR).join(variant_key)
    }

    #[must_use]
    pub fn processing_info_path(&self) -> PathBuf {
        self.video_dir.join(format!("{}_processing_info.json", self.video_id))
    }
}
