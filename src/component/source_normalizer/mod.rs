//! Canonical re-encoding
//!
//! Turns a source video into an all-intra H.264 file on which every frame is
//! independently decodable, so the canonical timeline is exactly seekable.

mod ffmpeg_command;
mod main;

pub use ffmpeg_command::{CANONICAL_CRF, INTRA_X264_ARGS, NormalizeCommand};
pub use main::{
    CanonicalVideo, FPS_MATCH_TOLERANCE, SourceNormalizer, count_non_keyframe_packets,
    resample_target,
};
