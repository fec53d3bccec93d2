//! Integration tests for the individual pipeline stages.
//!
//! Fixtures are generated with ffmpeg's `testsrc2` source into a temporary
//! directory. Tests are skipped when ffmpeg or ffprobe is not installed.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use frame_timeline::component::frame_extractor::{FrameExtractor, TIMESTAMP_TABLE_FILE};
use frame_timeline::component::source_normalizer::SourceNormalizer;
use frame_timeline::component::variant_generator::{Variant, VariantGenerator, duration_tolerance};
use frame_timeline::config::{DEFAULT_DURATION_TOLERANCE, VideoConfig};
use frame_timeline::error::PipelineError;
use frame_timeline::tools::get_video_info;
use tempfile::TempDir;

fn ffmpeg_available() -> bool {
    let probe = |tool: &str| {
        Command::new(tool)
            .arg("-version")
            .output()
            .is_ok_and(|o| o.status.success())
    };
    probe("ffmpeg") && probe("ffprobe")
}

fn make_source(dir: &Path, name: &str, rate: u32, duration: f64) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc2=size=320x240:rate={rate}:duration={duration}"))
        .args(["-pix_fmt", "yuv420p", "-c:v", "libx264", "-preset", "ultrafast"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success(), "fixture generation failed for {name}");
    path
}

fn video_config(id: &str, source: &Path, canonical_fps: f64) -> VideoConfig {
    VideoConfig {
        id: id.to_string(),
        source_video: source.to_path_buf(),
        canonical_fps,
        fps_variants: Vec::new(),
        clips: Vec::new(),
    }
}

fn shutdown() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

/// Test 1: canonical encode keeps duration and frame rate
#[test]
fn test_normalize_preserves_duration() {
    if !ffmpeg_available() {
        println!("Skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path(), "source.mp4", 60, 4.0);
    let source_info = get_video_info(&source).unwrap();

    let normalizer = SourceNormalizer::new(shutdown(), DEFAULT_DURATION_TOLERANCE);
    let canonical_path = dir.path().join("cam").join("canonical.mp4");
    let canonical = normalizer
        .normalize(&video_config("cam", &source, 60.0), &canonical_path)
        .unwrap();

    println!(
        "Canonical: {:.3}s at {} fps ({}x{})",
        canonical.duration_seconds, canonical.fps, canonical.width, canonical.height
    );
    assert!(canonical_path.exists(), "canonical file should exist");
    assert!((canonical.fps - 60.0).abs() < 1e-3);
    assert!(
        (canonical.duration_seconds - source_info.duration_seconds).abs() <= DEFAULT_DURATION_TOLERANCE,
        "canonical duration should match the source"
    );
    assert_eq!((canonical.width, canonical.height), (320, 240));
}

/// Test 2: a source at another rate is resampled to the declared rate
#[test]
fn test_normalize_resamples_to_declared_fps() {
    if !ffmpeg_available() {
        println!("Skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path(), "source_25.mp4", 25, 3.0);

    let normalizer = SourceNormalizer::new(shutdown(), DEFAULT_DURATION_TOLERANCE);
    let canonical_path = dir.path().join("canonical.mp4");
    let canonical = normalizer
        .normalize(&video_config("pal", &source, 30.0), &canonical_path)
        .unwrap();

    assert!((canonical.detected_source_fps - 25.0).abs() < 1e-3);
    assert!((canonical.fps - 30.0).abs() < 1e-3);
    assert!((canonical.duration_seconds - 3.0).abs() <= DEFAULT_DURATION_TOLERANCE);
}

/// Test 3: missing source fails without creating output
#[test]
fn test_normalize_missing_source() {
    let dir = TempDir::new().unwrap();
    let normalizer = SourceNormalizer::new(shutdown(), DEFAULT_DURATION_TOLERANCE);
    let canonical_path = dir.path().join("ghost").join("canonical.mp4");
    let result = normalizer.normalize(
        &video_config("ghost", &dir.path().join("missing.mp4"), 30.0),
        &canonical_path,
    );

    assert!(matches!(result, Err(PipelineError::SourceMissing { .. })));
    assert!(!canonical_path.exists());
}

/// Test 4: variants, then frames with strictly increasing timestamps
#[test]
fn test_variant_and_frame_extraction() {
    if !ffmpeg_available() {
        println!("Skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path(), "source.mp4", 60, 4.0);
    let normalizer = SourceNormalizer::new(shutdown(), DEFAULT_DURATION_TOLERANCE);
    let canonical = normalizer
        .normalize(&video_config("cam", &source, 60.0), &dir.path().join("canonical.mp4"))
        .unwrap();

    let generator = VariantGenerator::new(shutdown(), DEFAULT_DURATION_TOLERANCE);
    let extractor = FrameExtractor::new(shutdown());

    for fps in [30.0, 10.0, 5.0] {
        let variant = Variant::full(fps).unwrap();
        let variant_path = dir.path().join(format!("{}.mp4", variant.key));
        let video = generator.generate(&canonical, &variant, &variant_path).unwrap();

        println!("{}: {:.3}s at {} fps", variant.key, video.duration_seconds, video.fps);
        assert!(
            (video.duration_seconds - canonical.duration_seconds).abs()
                <= duration_tolerance(DEFAULT_DURATION_TOLERANCE, fps),
            "{} should keep the canonical duration",
            variant.key
        );

        let frames_dir = dir.path().join(format!("frames_{}", variant.key));
        let frames = extractor.extract(&video, fps, &frames_dir).unwrap();
        println!("  extracted {} frames", frames.len());

        assert!(frames_dir.join(TIMESTAMP_TABLE_FILE).exists());
        assert!(!frames.is_empty());
        for (i, record) in frames.records.iter().enumerate() {
            assert_eq!(record.index, i as u64, "indices should be dense");
            assert!(record.image_path.exists(), "frame image should exist");
        }
        for pair in frames.records.windows(2) {
            assert!(
                pair[1].timestamp > pair[0].timestamp,
                "timestamps should be strictly increasing"
            );
        }

        let reloaded = extractor.load_existing(&video, &frames_dir).unwrap();
        assert_eq!(reloaded.records, frames.records);
    }
}

/// Test 5: a clip keeps its own duration and starts at its own time zero
#[test]
fn test_clip_variant() {
    if !ffmpeg_available() {
        println!("Skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path(), "source.mp4", 60, 5.0);
    let normalizer = SourceNormalizer::new(shutdown(), DEFAULT_DURATION_TOLERANCE);
    let canonical = normalizer
        .normalize(&video_config("cam", &source, 60.0), &dir.path().join("canonical.mp4"))
        .unwrap();

    let generator = VariantGenerator::new(shutdown(), DEFAULT_DURATION_TOLERANCE);
    let variant = Variant::clip("clip_001", None, 1.0, 3.0, 30.0).unwrap();
    let video = generator
        .generate(&canonical, &variant, &dir.path().join("clip.mp4"))
        .unwrap();

    assert!((video.duration_seconds - 2.0).abs() <= duration_tolerance(DEFAULT_DURATION_TOLERANCE, 30.0));
    assert_eq!(variant.clip_start_canonical_frame(canonical.fps).unwrap(), 60);

    let frames = FrameExtractor::new(shutdown())
        .extract(&video, 30.0, &dir.path().join("frames_clip"))
        .unwrap();
    let count = frames.len() as i64;
    assert!((59..=61).contains(&count), "expected about 60 frames, got {count}");
    assert!(frames.records[0].timestamp.abs() < 0.05, "clip should start at zero");
}

/// Test 6: a clip past the end of the canonical video is rejected
#[test]
fn test_clip_beyond_canonical_end() {
    if !ffmpeg_available() {
        println!("Skipping: ffmpeg/ffprobe not installed");
        return;
    }
    let dir = TempDir::new().unwrap();
    let source = make_source(dir.path(), "source.mp4", 30, 2.0);
    let canonical = SourceNormalizer::new(shutdown(), DEFAULT_DURATION_TOLERANCE)
        .normalize(&video_config("cam", &source, 30.0), &dir.path().join("canonical.mp4"))
        .unwrap();

    let variant = Variant::clip("late", None, 1.0, 9.0, 10.0).unwrap();
    let variant_path = dir.path().join("late.mp4");
    let result = VariantGenerator::new(shutdown(), DEFAULT_DURATION_TOLERANCE).generate(
        &canonical,
        &variant,
        &variant_path,
    );

    assert!(matches!(result, Err(PipelineError::Config(_))));
    assert!(!variant_path.exists());
}
