pub mod load;
pub mod timecode;
pub mod types;

pub use timecode::parse_timecode;
pub use types::{
    ClipConfig, Config, DEFAULT_CONFIG_FILE, DEFAULT_DURATION_TOLERANCE, DEFAULT_OUTPUT_ROOT,
    VariantFilter, VideoConfig,
};
