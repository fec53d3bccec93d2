//! FPS variants and clips derived from the canonical video

mod ffmpeg_command;
mod main;
mod variant;

pub use ffmpeg_command::VariantCommand;
pub use main::{FPS_TOLERANCE, VariantGenerator, VariantVideo, duration_tolerance, validate_variant_info};
pub use variant::{Variant, VariantKind, VariantResolution, format_fps, resolve_variants};
