/// Slack when comparing a frame timestamp to a selection boundary
const BOUNDARY_EPSILON: f64 = 1e-6;
/// Target rates within this of the encoded rate keep every frame
const RATE_EPSILON: f64 = 1e-3;

/// Pick decode-order frame positions to keep for `target_fps`.
///
/// Frames without a measured timestamp are never selected. When the target
/// rate is at least the encoded rate every timed frame is kept; otherwise,
/// for each boundary `k / target_fps`, the first not-yet-selected frame at or
/// after the boundary is taken. Selected timestamps are strictly increasing.
#[must_use]
pub fn select_frames(timestamps: &[Option<f64>], target_fps: f64, effective_fps: f64) -> Vec<usize> {
    if target_fps + RATE_EPSILON >= effective_fps {
        keep_all(timestamps)
    } else {
        select_on_boundaries(timestamps, target_fps)
    }
}

fn keep_all(timestamps: &[Option<f64>]) -> Vec<usize> {
    let mut selected = Vec::with_capacity(timestamps.len());
    let mut last: Option<f64> = None;
    for (position, ts) in timestamps.iter().enumerate() {
        let Some(ts) = *ts else { continue };
        if last.is_some_and(|prev| ts <= prev) {
            continue;
        }
        selected.push(position);
        last = Some(ts);
    }
    selected
}

fn select_on_boundaries(timestamps: &[Option<f64>], target_fps: f64) -> Vec<usize> {
    let mut selected = Vec::new();
    let mut last: Option<f64> = None;
    let mut cursor = 0;
    let mut k: u64 = 0;

    while cursor < timestamps.len() {
        let boundary = k as f64 / target_fps;
        let candidate = timestamps[cursor..].iter().enumerate().find_map(|(offset, ts)| {
            let ts = (*ts)?;
            let after_last = last.is_none_or(|prev| ts > prev);
            (after_last && ts + BOUNDARY_EPSILON >= boundary).then_some((cursor + offset, ts))
        });

        let Some((position, ts)) = candidate else { break };
        selected.push(position);
        last = Some(ts);
        cursor = position + 1;
        k += 1;
    }
    selected
}

/// Rate implied by measured timestamps: `(n - 1) / (last - first)`.
#[must_use]
pub fn effective_fps(timestamps: &[Option<f64>]) -> Option<f64> {
    let mut timed = timestamps.iter().filter_map(|ts| *ts);
    let first = timed.next()?;
    let (count, last) = timed.fold((1_usize, first), |(count, _), ts| (count + 1, ts));
    let span = last - first;
    (count > 1 && span > 0.0).then(|| (count - 1) as f64 / span)
}
