//! Frame extraction
//!
//! Decodes a variant into still images and pairs every dense frame index with
//! the timestamp the decoder reported for it.

mod frame_selector;
mod main;
mod timestamp_probe;
mod timestamp_table;

pub use frame_selector::{effective_fps, select_frames};
pub use main::{FrameExtractor, FrameSet, check_frame_count};
pub use timestamp_probe::{parse_frame_timestamps, probe_frame_timestamps};
pub use timestamp_table::{
    FrameEntry, FrameRecord, FrameTimestampTable, TIMESTAMP_TABLE_FILE, frame_filename,
};
