use super::cache_index::{ProcessingInfo, SourceFingerprint, VariantRecord};
use super::layout::OutputLayout;
use super::report::{RunReport, StepOutcome, VariantReport, VideoReport};
use super::video_lock::VideoLock;
use crate::component::frame_extractor::{FrameExtractor, FrameTimestampTable, TIMESTAMP_TABLE_FILE};
use crate::component::source_normalizer::{CanonicalVideo, SourceNormalizer};
use crate::component::variant_generator::{
    Variant, VariantGenerator, VariantResolution, resolve_variants,
};
use crate::config::{Config, VariantFilter, VideoConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::tools::{CpuMonitor, discard_directory, discard_file, ensure_directory_exists};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Instant, SystemTime};
use walkdir::WalkDir;

const PARTIAL_MARKER: &str = ".partial-";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Rebuild every artifact even when the cache says it is current
    pub force: bool,
    /// Re-probe existing artifacts without writing anything
    pub validate_only: bool,
    pub filter: VariantFilter,
}

enum VariantUpdate {
    Built(String, VariantRecord),
    Failed(String, String),
}

pub struct ProcessingOrchestrator {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
    normalizer: SourceNormalizer,
    generator: VariantGenerator,
    extractor: FrameExtractor,
    pool: ThreadPool,
    progress: ProgressBar,
}

impl ProcessingOrchestrator {
    pub fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> PipelineResult<Self> {
        let workers = config
            .workers
            .unwrap_or_else(|| CpuMonitor::new().suggested_workers());
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("pipeline-worker-{i}"))
            .build()
            .map_err(|e| PipelineError::Config(format!("cannot start {workers} workers: {e}")))?;
        info!("Processing pool started with {workers} workers");

        let tolerance = config.duration_tolerance_seconds;
        Ok(Self {
            normalizer: SourceNormalizer::new(Arc::clone(&shutdown_signal), tolerance),
            generator: VariantGenerator::new(Arc::clone(&shutdown_signal), tolerance),
            extractor: FrameExtractor::new(Arc::clone(&shutdown_signal)),
            config,
            shutdown_signal,
            pool,
            progress: ProgressBar::hidden(),
        })
    }

    /// Show a per-variant progress bar on stderr.
    #[must_use]
    pub fn with_progress(mut self) -> Self {
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        self.progress = ProgressBar::new(0);
        self.progress.set_style(style);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn process_all(&self, options: RunOptions) -> RunReport {
        let videos: Vec<&VideoConfig> = self.config.videos.iter().collect();
        self.run(&videos, options)
    }

    pub fn process_video(&self, video_id: &str, options: RunOptions) -> PipelineResult<RunReport> {
        let video = self
            .config
            .find_video(video_id)
            .ok_or_else(|| PipelineError::Config(format!("unknown video id '{video_id}'")))?;
        Ok(self.run(&[video], options))
    }

    fn run(&self, videos: &[&VideoConfig], options: RunOptions) -> RunReport {
        let started = Instant::now();
        let variant_count: usize = videos
            .iter()
            .map(|v| resolve_variants(v, options.filter).len())
            .sum();
        self.progress.set_length(variant_count as u64);
        self.progress.set_position(0);
        self.progress.set_message(if options.validate_only { "validating" } else { "processing" });

        info!(
            "Starting run over {} videos ({variant_count} variants, filter {}, force {}, validate only {})",
            videos.len(),
            options.filter,
            options.force,
            options.validate_only
        );

        let reports: Vec<VideoReport> = self.pool.install(|| {
            videos
                .par_iter()
                .map(|video| self.run_video(video, options))
                .collect()
        });

        self.progress.finish_with_message("done");
        let report = RunReport {
            videos: reports,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        };
        let summary = report.summary();
        info!(
            "Run finished in {:.1}s: {} generated, {} skipped, {} validated, {} failed, {} videos failed",
            report.elapsed_seconds,
            summary.generated,
            summary.skipped,
            summary.validated,
            summary.failed,
            summary.failed_videos
        );
        report
    }

    fn run_video(&self, video: &VideoConfig, options: RunOptions) -> VideoReport {
        let layout = OutputLayout::new(&self.config.output_root, &video.id);
        let lock = VideoLock::for_directory(layout.video_dir());
        let Some(_guard) = lock.try_acquire() else {
            let err = PipelineError::Busy {
                video_id: video.id.clone(),
            };
            warn!("{err}");
            return VideoReport::failed(&video.id, &err);
        };

        if options.validate_only {
            self.validate_video(video, &layout, options.filter)
        } else {
            self.build_video(video, &layout, options)
        }
    }

    fn build_video(&self, video: &VideoConfig, layout: &OutputLayout, options: RunOptions) -> VideoReport {
        info!("[{}] Processing {}", video.id, video.source_video.display());
        let info_path = layout.processing_info_path();
        let previous = ProcessingInfo::load(&info_path).unwrap_or_else(|e| {
            warn!("[{}] Ignoring processing info: {e}", video.id);
            None
        });

        let fingerprint = match SourceFingerprint::compute(
            &video.source_video,
            previous.as_ref().map(|p| &p.source_fingerprint),
        ) {
            Ok(fingerprint) => fingerprint,
            Err(e) => {
                error!("[{}] {e}", video.id);
                return VideoReport::failed(&video.id, &e);
            }
        };

        sweep_partials(layout.video_dir());

        let canonical_path = layout.canonical_path();
        let reusable = previous.as_ref().filter(|p| {
            !options.force
                && p.source_fingerprint.same_content(&fingerprint)
                && (p.canonical_fps - video.canonical_fps).abs() < f64::EPSILON
                && p.canonical.path == canonical_path
                && canonical_path.is_file()
        });
        let (canonical, canonical_outcome) = match reusable {
            Some(p) => {
                info!("[{}] Canonical video is current, skipping", video.id);
                (p.canonical.clone(), StepOutcome::Skipped)
            }
            None => match self.normalizer.normalize(video, &canonical_path) {
                Ok(canonical) => (canonical, StepOutcome::Generated),
                Err(e) => {
                    error!("[{}] Canonical encode failed: {e}", video.id);
                    let variants = resolve_variants(video, options.filter).len() as u64;
                    self.progress.inc(variants);
                    return VideoReport::failed(&video.id, &e);
                }
            },
        };
        let canonical_regenerated = canonical_outcome == StepOutcome::Generated;

        let previous_records = previous
            .as_ref()
            .filter(|_| !options.force && !canonical_regenerated)
            .map(|p| &p.variants);

        let results: Vec<(VariantReport, VariantUpdate)> = resolve_variants(video, options.filter)
            .into_par_iter()
            .map(|entry| {
                let result = self.build_variant(video, layout, &canonical, entry, previous_records);
                self.progress.inc(1);
                result
            })
            .collect();

        let (reports, updates): (Vec<VariantReport>, Vec<VariantUpdate>) = results.into_iter().unzip();

        let next = merge_info(
            video,
            previous.as_ref(),
            fingerprint,
            canonical,
            canonical_regenerated,
            updates,
        );
        if previous.as_ref() != Some(&next) {
            if let Err(e) = ensure_directory_exists(layout.video_dir())
                .map_err(PipelineError::from)
                .and_then(|()| next.save(&info_path))
            {
                error!("[{}] Failed to write {}: {e}", video.id, info_path.display());
                return VideoReport {
                    video_id: video.id.clone(),
                    canonical: canonical_outcome,
                    error: Some((&e).into()),
                    variants: reports,
                };
            }
            info!("[{}] Wrote {}", video.id, info_path.display());
        } else {
            debug!("[{}] Processing info unchanged", video.id);
        }

        VideoReport {
            video_id: video.id.clone(),
            canonical: canonical_outcome,
            error: None,
            variants: reports,
        }
    }

    fn build_variant(
        &self,
        video: &VideoConfig,
        layout: &OutputLayout,
        canonical: &CanonicalVideo,
        entry: VariantResolution,
        previous_records: Option<&BTreeMap<String, VariantRecord>>,
    ) -> (VariantReport, VariantUpdate) {
        let variant = match entry {
            Ok(variant) => variant,
            Err((key, e)) => {
                warn!("[{}] Variant {key} is misconfigured: {e}", video.id);
                let report = VariantReport::failed(&key, &e);
                return (report, VariantUpdate::Failed(key, e.to_string()));
            }
        };

        let key = variant.key.clone();
        let variant_path = layout.variant_path(&key);
        let frames_dir = layout.frames_dir(&key);
        let fingerprint = variant.descriptor_fingerprint(canonical.fps);

        if let Some(record) = previous_records.and_then(|records| records.get(&key))
            && record.descriptor_fingerprint == fingerprint
            && is_cached(&key, record, &variant_path, &canonical.path, &frames_dir)
        {
            info!("[{}] Variant {key} is current, skipping", video.id);
            let report = VariantReport::succeeded(&key, StepOutcome::Skipped, record.frame_count, record.duration_seconds);
            return (report, VariantUpdate::Built(key, record.clone()));
        }

        match self.generate_variant(canonical, &variant, &variant_path, &frames_dir, fingerprint) {
            Ok(record) => {
                let report = VariantReport::succeeded(
                    &key,
                    StepOutcome::Generated,
                    record.frame_count,
                    record.duration_seconds,
                );
                (report, VariantUpdate::Built(key, record))
            }
            Err(e) => {
                error!("[{}] Variant {key} failed: {e}", video.id);
                discard_file(&variant_path);
                discard_directory(&frames_dir);
                let report = VariantReport::failed(&key, &e);
                (report, VariantUpdate::Failed(key, e.to_string()))
            }
        }
    }

    fn generate_variant(
        &self,
        canonical: &CanonicalVideo,
        variant: &Variant,
        variant_path: &Path,
        frames_dir: &Path,
        descriptor_fingerprint: String,
    ) -> PipelineResult<VariantRecord> {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return Err(PipelineError::Cancelled);
        }
        let clip_start_canonical_frame = variant.clip_start_canonical_frame(canonical.fps)?;
        let variant_video = self.generator.generate(canonical, variant, variant_path)?;
        let frames = self.extractor.extract(&variant_video, variant.fps, frames_dir)?;

        Ok(VariantRecord {
            kind: variant.kind.clone(),
            fps: variant.fps,
            clip_start_canonical_frame,
            duration_seconds: variant_video.duration_seconds,
            frame_count: frames.len() as u64,
            video_file: file_name_of(variant_path),
            frames_dir: format!("frames/{}", variant.key),
            descriptor_fingerprint,
        })
    }

    /// Re-probe existing artifacts without writing anything.
    fn validate_video(&self, video: &VideoConfig, layout: &OutputLayout, filter: VariantFilter) -> VideoReport {
        let variants = resolve_variants(video, filter);
        let fail_video = |e: PipelineError| {
            error!("[{}] Validation failed: {e}", video.id);
            self.progress.inc(variants.len() as u64);
            VideoReport::failed(&video.id, &e)
        };

        let info = match ProcessingInfo::load(&layout.processing_info_path()) {
            Ok(Some(info)) => info,
            Ok(None) => {
                return fail_video(PipelineError::Validation(format!(
                    "video '{}' has not been processed",
                    video.id
                )));
            }
            Err(e) => return fail_video(e),
        };

        let canonical = match self.check_canonical(video, layout, &info) {
            Ok(canonical) => canonical,
            Err(e) => return fail_video(e),
        };

        let reports = variants
            .into_par_iter()
            .map(|entry| {
                let report = match entry {
                    Ok(variant) => self
                        .check_variant(layout, &canonical, &variant, &info)
                        .map_or_else(
                            |e| VariantReport::failed(&variant.key, &e),
                            |(frames, duration)| {
                                VariantReport::succeeded(&variant.key, StepOutcome::Validated, frames, duration)
                            },
                        ),
                    Err((key, e)) => VariantReport::failed(&key, &e),
                };
                self.progress.inc(1);
                report
            })
            .collect();

        VideoReport {
            video_id: video.id.clone(),
            canonical: StepOutcome::Validated,
            error: None,
            variants: reports,
        }
    }

    fn check_canonical(
        &self,
        video: &VideoConfig,
        layout: &OutputLayout,
        info: &ProcessingInfo,
    ) -> PipelineResult<CanonicalVideo> {
        let canonical = self
            .normalizer
            .inspect(video, &layout.canonical_path(), info.detected_source_fps)?;
        let drift = (canonical.duration_seconds - info.canonical.duration_seconds).abs();
        if drift > self.config.duration_tolerance_seconds {
            return Err(PipelineError::Validation(format!(
                "canonical duration {:.3}s no longer matches recorded {:.3}s",
                canonical.duration_seconds, info.canonical.duration_seconds
            )));
        }
        Ok(canonical)
    }

    fn check_variant(
        &self,
        layout: &OutputLayout,
        canonical: &CanonicalVideo,
        variant: &Variant,
        info: &ProcessingInfo,
    ) -> PipelineResult<(u64, f64)> {
        let record = info.variants.get(&variant.key).ok_or_else(|| {
            PipelineError::Validation(format!("variant {} has not been built", variant.key))
        })?;
        if record.descriptor_fingerprint != variant.descriptor_fingerprint(canonical.fps) {
            return Err(PipelineError::Validation(format!(
                "variant {} was built from a different descriptor",
                variant.key
            )));
        }

        let variant_video = self
            .generator
            .validate_existing(canonical, variant, &layout.variant_path(&variant.key))?;
        let frames = self
            .extractor
            .load_existing(&variant_video, &layout.frames_dir(&variant.key))?;
        Ok((frames.len() as u64, variant_video.duration_seconds))
    }
}

/// A previous build is reusable when its files are present, newer than the
/// canonical video and its frame table is intact.
fn is_cached(key: &str, record: &VariantRecord, variant_path: &Path, canonical_path: &Path, frames_dir: &Path) -> bool {
    let newer_than_canonical = match (modified(variant_path), modified(canonical_path)) {
        (Some(variant), Some(canonical)) => variant >= canonical,
        _ => false,
    };
    if !newer_than_canonical {
        return false;
    }

    FrameTimestampTable::load(&frames_dir.join(TIMESTAMP_TABLE_FILE))
        .and_then(|table| table.validate().map(|()| table))
        .is_ok_and(|table| table.variant == key && table.total_frames == record.frame_count)
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path)
        .ok()
        .filter(fs::Metadata::is_file)
        .and_then(|m| m.modified().ok())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn merge_info(
    video: &VideoConfig,
    previous: Option<&ProcessingInfo>,
    source_fingerprint: SourceFingerprint,
    canonical: CanonicalVideo,
    canonical_regenerated: bool,
    updates: Vec<VariantUpdate>,
) -> ProcessingInfo {
    let configured: HashSet<String> = resolve_variants(video, VariantFilter::All)
        .into_iter()
        .map(|entry| match entry {
            Ok(variant) => variant.key,
            Err((key, _)) => key,
        })
        .collect();

    // Records built against a replaced canonical video are no longer valid
    let (mut variants, mut failed_variants) = match previous {
        Some(p) if !canonical_regenerated => (p.variants.clone(), p.failed_variants.clone()),
        _ => (BTreeMap::new(), BTreeMap::new()),
    };
    variants.retain(|key, _| configured.contains(key));
    failed_variants.retain(|key, _| configured.contains(key));

    let mut built_this_run = HashSet::new();
    for update in updates {
        match update {
            VariantUpdate::Built(key, record) => {
                failed_variants.remove(&key);
                built_this_run.insert(key.clone());
                variants.insert(key, record);
            }
            // A record built in this run stays; its artifacts are on disk
            VariantUpdate::Failed(key, message) if built_this_run.contains(&key) => {
                warn!("[{}] Keeping freshly built {key} despite a later failure: {message}", video.id);
            }
            VariantUpdate::Failed(key, message) => {
                variants.remove(&key);
                failed_variants.insert(key, message);
            }
        }
    }

    ProcessingInfo {
        video_id: video.id.clone(),
        source_video: video.source_video.clone(),
        source_fingerprint,
        detected_source_fps: canonical.detected_source_fps,
        canonical_fps: canonical.fps,
        canonical,
        variants,
        failed_variants,
    }
}

/// Remove partial outputs left behind by an interrupted run.
fn sweep_partials(video_dir: &Path) {
    if !video_dir.is_dir() {
        return;
    }
    let leftovers: Vec<_> = WalkDir::new(video_dir)
        .max_depth(2)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().contains(PARTIAL_MARKER))
        .map(walkdir::DirEntry::into_path)
        .collect();

    for path in leftovers {
        if path.is_dir() {
            discard_directory(&path);
        } else {
            discard_file(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::variant_generator::VariantKind;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn video() -> VideoConfig {
        VideoConfig {
            id: "cam".to_string(),
            source_video: PathBuf::from("cam.mov"),
            canonical_fps: 60.0,
            fps_variants: vec![30.0, 10.0],
            clips: Vec::new(),
        }
    }

    fn canonical() -> CanonicalVideo {
        CanonicalVideo {
            path: PathBuf::from("out/cam/cam__canonical.mp4"),
            duration_seconds: 7.75,
            fps: 60.0,
            detected_source_fps: 60.0,
            width: 640,
            height: 360,
            has_audio: false,
        }
    }

    fn record(frame_count: u64) -> VariantRecord {
        VariantRecord {
            kind: VariantKind::Full,
            fps: 30.0,
            clip_start_canonical_frame: 0,
            duration_seconds: 7.75,
            frame_count,
            video_file: "cam__full_30.mp4".to_string(),
            frames_dir: "frames/full_30".to_string(),
            descriptor_fingerprint: "fp".to_string(),
        }
    }

    fn fingerprint() -> SourceFingerprint {
        SourceFingerprint {
            size: 1,
            modified_unix_ms: 2,
            blake3: "h".to_string(),
        }
    }

    #[test]
    fn test_merge_info_applies_updates_and_drops_unconfigured() {
        let mut previous = merge_info(&video(), None, fingerprint(), canonical(), true, Vec::new());
        previous.variants.insert("full_30".to_string(), record(233));
        previous.variants.insert("full_5".to_string(), record(38));

        let next = merge_info(
            &video(),
            Some(&previous),
            fingerprint(),
            canonical(),
            false,
            vec![VariantUpdate::Failed("full_10".to_string(), "boom".to_string())],
        );

        assert!(next.variants.contains_key("full_30"));
        assert!(!next.variants.contains_key("full_5"));
        assert_eq!(next.failed_variants.get("full_10").map(String::as_str), Some("boom"));
    }

    #[test]
    fn test_merge_info_keeps_variant_built_alongside_its_duplicate() {
        let repeated = VideoConfig {
            fps_variants: vec![30.0, 30.0],
            ..video()
        };
        let updates: Vec<VariantUpdate> = resolve_variants(&repeated, VariantFilter::All)
            .into_iter()
            .map(|entry| match entry {
                Ok(variant) => VariantUpdate::Built(variant.key, record(233)),
                Err((key, e)) => VariantUpdate::Failed(key, e.to_string()),
            })
            .collect();

        let next = merge_info(&repeated, None, fingerprint(), canonical(), true, updates);
        assert_eq!(next.variants.get("full_30").map(|r| r.frame_count), Some(233));
        assert!(!next.failed_variants.contains_key("full_30"));
        assert!(next.failed_variants.contains_key("full_30#2"));

        // Even a same-key failure after the build leaves the record in place
        let next = merge_info(
            &video(),
            None,
            fingerprint(),
            canonical(),
            true,
            vec![
                VariantUpdate::Built("full_30".to_string(), record(233)),
                VariantUpdate::Failed("full_30".to_string(), "late".to_string()),
            ],
        );
        assert!(next.variants.contains_key("full_30"));
        assert!(next.failed_variants.is_empty());
    }

    #[test]
    fn test_merge_info_resets_after_new_canonical() {
        let mut previous = merge_info(&video(), None, fingerprint(), canonical(), true, Vec::new());
        previous.variants.insert("full_30".to_string(), record(233));

        let next = merge_info(&video(), Some(&previous), fingerprint(), canonical(), true, Vec::new());
        assert!(next.variants.is_empty());
    }

    #[test]
    fn test_is_cached_requires_fresh_files_and_table() {
        let dir = tempdir().unwrap();
        let canonical_path = dir.path().join("cam__canonical.mp4");
        let variant_path = dir.path().join("cam__full_30.mp4");
        let frames_dir = dir.path().join("frames").join("full_30");
        fs::write(&canonical_path, b"c").unwrap();
        fs::write(&variant_path, b"v").unwrap();
        fs::create_dir_all(&frames_dir).unwrap();

        // No frame table yet
        assert!(!is_cached("full_30", &record(2), &variant_path, &canonical_path, &frames_dir));

        FrameTimestampTable::new("full_30", 30.0, &[(0, 0.0), (1, 1.0 / 30.0)])
            .save(&frames_dir.join(TIMESTAMP_TABLE_FILE))
            .unwrap();
        assert!(is_cached("full_30", &record(2), &variant_path, &canonical_path, &frames_dir));
        assert!(!is_cached("full_30", &record(3), &variant_path, &canonical_path, &frames_dir));
        assert!(!is_cached("full_10", &record(2), &variant_path, &canonical_path, &frames_dir));

        fs::remove_file(&variant_path).unwrap();
        assert!(!is_cached("full_30", &record(2), &variant_path, &canonical_path, &frames_dir));
    }

    #[test]
    fn test_sweep_partials() {
        let dir = tempdir().unwrap();
        let video_dir = dir.path().join("cam");
        let frames = video_dir.join("frames");
        fs::create_dir_all(frames.join("full_30.partial-abc")).unwrap();
        fs::create_dir_all(frames.join("full_10")).unwrap();
        fs::write(video_dir.join("cam__full_30.partial-def.mp4"), b"x").unwrap();
        fs::write(video_dir.join("cam__full_30.mp4"), b"x").unwrap();

        sweep_partials(&video_dir);

        assert!(!frames.join("full_30.partial-abc").exists());
        assert!(!video_dir.join("cam__full_30.partial-def.mp4").exists());
        assert!(frames.join("full_10").exists());
        assert!(video_dir.join("cam__full_30.mp4").exists());
    }

    #[test]
    fn test_unknown_video_is_config_error() {
        let config = Config {
            output_root: PathBuf::from("out"),
            workers: Some(1),
            duration_tolerance_seconds: 0.05,
            videos: vec![video()],
        };
        let orchestrator = ProcessingOrchestrator::new(config, Arc::new(AtomicBool::new(false))).unwrap();
        assert!(matches!(
            orchestrator.process_video("missing", RunOptions::default()),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_missing_source_fails_only_that_video() {
        let dir = tempdir().unwrap();
        let config = Config {
            output_root: dir.path().join("out"),
            workers: Some(2),
            duration_tolerance_seconds: 0.05,
            videos: vec![VideoConfig {
                source_video: dir.path().join("absent.mov"),
                ..video()
            }],
        };
        let orchestrator = ProcessingOrchestrator::new(config, Arc::new(AtomicBool::new(false))).unwrap();

        let report = orchestrator.process_all(RunOptions::default());

        let cam = report.video("cam").unwrap();
        assert_eq!(cam.canonical, StepOutcome::Failed);
        assert_eq!(cam.error.as_ref().map(|e| e.kind.as_str()), Some("source_missing"));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_validate_only_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = Config {
            output_root: dir.path().join("out"),
            workers: Some(1),
            duration_tolerance_seconds: 0.05,
            videos: vec![video()],
        };
        let orchestrator = ProcessingOrchestrator::new(config, Arc::new(AtomicBool::new(false))).unwrap();

        let report = orchestrator.process_all(RunOptions {
            validate_only: true,
            ..RunOptions::default()
        });

        assert!(report.has_failures());
        assert!(!dir.path().join("out").exists());
    }
}
