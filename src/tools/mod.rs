mod cpu_monitor;
mod ffmpeg_runner;
mod ffprobe_info;
mod file_hasher;
mod path_validator;

pub use cpu_monitor::CpuMonitor;
pub use ffmpeg_runner::{retry_once, run_ffmpeg};
pub use ffprobe_info::{VideoInfo, get_video_info, parse_frame_rate};
pub use file_hasher::{calculate_bytes_hash, calculate_file_hash};
pub use path_validator::{
    commit_partial, discard_directory, discard_file, ensure_directory_exists, partial_path_for,
    validate_file_exists,
};
