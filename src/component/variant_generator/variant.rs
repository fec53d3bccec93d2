use crate::component::source_normalizer::CANONICAL_CRF;
use crate::component::timeline_mapper::clip_start_canonical_frame;
use crate::config::{VariantFilter, VideoConfig, parse_timecode};
use crate::error::{PipelineError, PipelineResult};
use crate::tools::calculate_bytes_hash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VariantKind {
    Full,
    Clip {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        /// Canonical-timeline seconds
        start_seconds: f64,
        end_seconds: f64,
    },
}

/// A derived video: full length or a clip, at one target frame rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub key: String,
    pub kind: VariantKind,
    pub fps: f64,
}

/// A variant the configuration names but which cannot be built, keyed by the
/// variant key it would have had.
pub type VariantResolution = Result<Variant, (String, PipelineError)>;

impl Variant {
    pub fn full(fps: f64) -> PipelineResult<Self> {
        check_fps(fps)?;
        Ok(Self {
            key: format!("full_{}", format_fps(fps)),
            kind: VariantKind::Full,
            fps,
        })
    }

    pub fn clip(
        name: &str,
        label: Option<String>,
        start_seconds: f64,
        end_seconds: f64,
        fps: f64,
    ) -> PipelineResult<Self> {
        check_fps(fps)?;
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(PipelineError::Config(format!("invalid clip name '{name}'")));
        }
        if !start_seconds.is_finite() || start_seconds < 0.0 {
            return Err(PipelineError::Config(format!(
                "clip '{name}' start {start_seconds} must be a non-negative time"
            )));
        }
        if !end_seconds.is_finite() || end_seconds <= start_seconds {
            return Err(PipelineError::Config(format!(
                "clip '{name}' end {end_seconds}s must be after start {start_seconds}s"
            )));
        }
        Ok(Self {
            key: format!("{name}_{}", format_fps(fps)),
            kind: VariantKind::Clip {
                name: name.to_string(),
                label,
                start_seconds,
                end_seconds,
            },
            fps,
        })
    }

    #[must_use]
    pub const fn is_clip(&self) -> bool {
        matches!(self.kind, VariantKind::Clip { .. })
    }

    /// Canonical-timeline second at which this variant's frame 0 sits.
    #[must_use]
    pub const fn start_seconds(&self) -> f64 {
        match self.kind {
            VariantKind::Full => 0.0,
            VariantKind::Clip { start_seconds, .. } => start_seconds,
        }
    }

    #[must_use]
    pub fn expected_duration(&self, canonical_duration: f64) -> f64 {
        match self.kind {
            VariantKind::Full => canonical_duration,
            VariantKind::Clip {
                start_seconds,
                end_seconds,
                ..
            } => end_seconds - start_seconds,
        }
    }

    pub fn clip_start_canonical_frame(&self, canonical_fps: f64) -> PipelineResult<u64> {
        clip_start_canonical_frame(self.start_seconds(), canonical_fps)
            .map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Stable hash of everything that determines the variant's bytes.
    #[must_use]
    pub fn descriptor_fingerprint(&self, canonical_fps: f64) -> String {
        let descriptor = format!(
            "{}|{:?}|{}|canonical:{canonical_fps}|crf:{CANONICAL_CRF}",
            self.key, self.kind, self.fps
        );
        calculate_bytes_hash(descriptor.as_bytes())
    }
}

/// Print a frame rate the way variant keys spell it: `30`, `29.97`, `2.5`.
#[must_use]
pub fn format_fps(fps: f64) -> String {
    format!("{fps}")
}

/// Expand a video's configuration into its variants, in configuration order.
///
/// Problems local to one variant (bad FPS, bad timecode, reversed range,
/// duplicate key) come back as `Err` entries so the rest still run.
#[must_use]
pub fn resolve_variants(video: &VideoConfig, filter: VariantFilter) -> Vec<VariantResolution> {
    let mut resolved = Vec::new();

    if filter.includes_full() {
        for &fps in &video.fps_variants {
            resolved.push(Variant::full(fps).map_err(|e| (format!("full_{}", format_fps(fps)), e)));
        }
    }

    if filter.includes_clips() {
        for clip in &video.clips {
            if clip.fps.is_empty() {
                resolved.push(Err((
                    clip.name.clone(),
                    PipelineError::Config(format!("clip '{}' lists no fps values", clip.name)),
                )));
                continue;
            }
            let range = parse_timecode(&clip.start)
                .and_then(|start| Ok((start, parse_timecode(&clip.end)?)))
                .map_err(|e| match e {
                    PipelineError::Config(message) => message,
                    other => other.to_string(),
                });
            for &fps in &clip.fps {
                let key = format!("{}_{}", clip.name, format_fps(fps));
                let variant = match &range {
                    Ok((start, end)) => Variant::clip(&clip.name, clip.label.clone(), *start, *end, fps),
                    Err(message) => Err(PipelineError::Config(format!("clip '{}': {message}", clip.name))),
                };
                resolved.push(variant.map_err(|e| (key, e)));
            }
        }
    }

    // Later repeats of a key are reported as `{key}#{n}` so they never
    // shadow the entry that owns the key
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    resolved
        .into_iter()
        .map(|entry| {
            let key = match &entry {
                Ok(variant) => variant.key.clone(),
                Err((key, _)) => key.clone(),
            };
            let seen = occurrences.entry(key.clone()).or_insert(0);
            *seen += 1;
            if *seen == 1 {
                return entry;
            }
            let message = format!("duplicate variant key '{key}'");
            Err((format!("{key}#{seen}"), PipelineError::Config(message)))
        })
        .collect()
}

fn check_fps(fps: f64) -> PipelineResult<()> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(PipelineError::Config(format!("target fps must be positive, got {fps}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClipConfig;
    use std::path::PathBuf;

    fn video(fps_variants: Vec<f64>, clips: Vec<ClipConfig>) -> VideoConfig {
        VideoConfig {
            id: "cam".to_string(),
            source_video: PathBuf::from("cam.mov"),
            canonical_fps: 60.0,
            fps_variants,
            clips,
        }
    }

    fn clip(name: &str, start: &str, end: &str, fps: Vec<f64>) -> ClipConfig {
        ClipConfig {
            name: name.to_string(),
            label: None,
            start: start.to_string(),
            end: end.to_string(),
            fps,
        }
    }

    #[test]
    fn test_format_fps() {
        assert_eq!(format_fps(30.0), "30");
        assert_eq!(format_fps(29.97), "29.97");
        assert_eq!(format_fps(2.5), "2.5");
    }

    #[test]
    fn test_variant_keys() {
        assert_eq!(Variant::full(30.0).unwrap().key, "full_30");
        let clip = Variant::clip("clip_001", None, 2.0, 8.0, 10.0).unwrap();
        assert_eq!(clip.key, "clip_001_10");
        assert!((clip.expected_duration(7.75) - 6.0).abs() < 1e-9);
        assert_eq!(clip.clip_start_canonical_frame(60.0).unwrap(), 120);
        assert_eq!(Variant::full(5.0).unwrap().clip_start_canonical_frame(60.0).unwrap(), 0);
    }

    #[test]
    fn test_invalid_variants() {
        assert!(matches!(Variant::full(0.0), Err(PipelineError::Config(_))));
        assert!(matches!(Variant::full(f64::NAN), Err(PipelineError::Config(_))));
        assert!(matches!(Variant::clip("c", None, 8.0, 2.0, 30.0), Err(PipelineError::Config(_))));
        assert!(matches!(Variant::clip("c", None, 2.0, 2.0, 30.0), Err(PipelineError::Config(_))));
        assert!(matches!(Variant::clip("a/b", None, 0.0, 2.0, 30.0), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_resolve_variants_isolates_bad_entries() {
        let config = video(
            vec![30.0, -5.0, 10.0],
            vec![
                clip("clip_001", "00:00:02", "00:00:08", vec![30.0, 5.0]),
                clip("broken", "00:00:09", "00:00:03", vec![30.0]),
                clip("garbled", "xx", "00:00:03", vec![30.0, 10.0]),
            ],
        );

        let resolved = resolve_variants(&config, VariantFilter::All);
        let keys: Vec<&str> = resolved
            .iter()
            .map(|r| match r {
                Ok(v) => v.key.as_str(),
                Err((key, _)) => key.as_str(),
            })
            .collect();
        assert_eq!(
            keys,
            [
                "full_30", "full_-5", "full_10", "clip_001_30", "clip_001_5", "broken_30",
                "garbled_30", "garbled_10"
            ]
        );
        let failures = resolved.iter().filter(|r| r.is_err()).count();
        assert_eq!(failures, 4);
    }

    #[test]
    fn test_resolve_variants_filter_and_duplicates() {
        let config = video(
            vec![30.0, 30.0],
            vec![clip("clip_001", "2", "8", vec![30.0])],
        );

        let full_only = resolve_variants(&config, VariantFilter::Full);
        assert_eq!(full_only.len(), 2);
        assert!(full_only[0].as_ref().is_ok_and(|v| v.key == "full_30"));
        assert!(matches!(&full_only[1], Err((key, PipelineError::Config(_))) if key == "full_30#2"));

        let clips_only = resolve_variants(&config, VariantFilter::Clips);
        assert_eq!(clips_only.len(), 1);
        assert!(clips_only[0].as_ref().is_ok_and(Variant::is_clip));
    }

    #[test]
    fn test_repeated_keys_get_distinct_report_keys() {
        let config = video(
            vec![-5.0, 10.0, -5.0, 10.0, 10.0],
            vec![clip("full", "0", "1", vec![10.0])],
        );

        let keys: Vec<String> = resolve_variants(&config, VariantFilter::All)
            .into_iter()
            .map(|r| match r {
                Ok(v) => v.key,
                Err((key, _)) => key,
            })
            .collect();
        assert_eq!(
            keys,
            ["full_-5", "full_10", "full_-5#2", "full_10#2", "full_10#3", "full_10#4"]
        );
    }

    #[test]
    fn test_clip_without_fps_is_reported() {
        let config = video(Vec::new(), vec![clip("empty", "0", "1", Vec::new())]);
        let resolved = resolve_variants(&config, VariantFilter::All);
        assert!(matches!(&resolved[..], [Err((key, PipelineError::Config(_)))] if key == "empty"));
    }

    #[test]
    fn test_descriptor_fingerprint_tracks_descriptor() {
        let a = Variant::clip("clip_001", None, 2.0, 8.0, 30.0).unwrap();
        let b = Variant::clip("clip_001", None, 2.0, 8.5, 30.0).unwrap();
        assert_eq!(a.descriptor_fingerprint(60.0), a.clone().descriptor_fingerprint(60.0));
        assert_ne!(a.descriptor_fingerprint(60.0), b.descriptor_fingerprint(60.0));
        assert_ne!(a.descriptor_fingerprint(60.0), a.descriptor_fingerprint(30.0));
    }

    #[test]
    fn test_variant_kind_serialization() {
        let json = serde_json::to_string(&Variant::full(10.0).unwrap().kind).unwrap();
        assert_eq!(json, r#"{"type":"full"}"#);
    }
}
