//! Screen/data mapping and axis helpers shared by the interactive panels.
//! Everything here is plain arithmetic on the time axis so it stays testable
//! without a UI context.

const MINUTE: f64 = 60.0;
const HOUR: f64 = 3600.0;
const DAY: f64 = 86_400.0;

/// Candidate tick spacings for a time axis, in seconds.
const TIME_STEPS: &[f64] = &[
    1.0, 5.0, 15.0, 30.0,
    MINUTE, 5.0 * MINUTE, 15.0 * MINUTE, 30.0 * MINUTE,
    HOUR, 3.0 * HOUR, 6.0 * HOUR, 12.0 * HOUR,
    DAY, 2.0 * DAY, 7.0 * DAY, 14.0 * DAY,
    30.0 * DAY, 91.0 * DAY, 182.0 * DAY, 365.0 * DAY,
];

/// Horizontal pixel for time `t` in a panel spanning `[left, left + width]`.
pub fn time_to_x(t: f64, range: (f64, f64), left: f32, width: f32) -> f32 {
    let span = (range.1 - range.0).max(f64::EPSILON);
    left + ((t - range.0) / span) as f32 * width
}

/// Time under horizontal pixel `x`.
pub fn x_to_time(x: f32, range: (f64, f64), left: f32, width: f32) -> f64 {
    let frac = ((x - left) / width.max(1.0)) as f64;
    range.0 + frac * (range.1 - range.0)
}

/// Vertical pixel for `value` in a panel whose plot area spans `[top, bottom]`.
pub fn value_to_y(value: f64, bounds: (f64, f64), top: f32, bottom: f32) -> f32 {
    let span = (bounds.1 - bounds.0).max(f64::EPSILON);
    bottom - ((value - bounds.0) / span) as f32 * (bottom - top)
}

/// Time shift for a horizontal drag of `drag_px` pixels. Dragging right moves
/// the window back in time.
pub fn drag_delta(range: (f64, f64), drag_px: f32, width: f32) -> f64 {
    -(drag_px as f64) * (range.1 - range.0) / width.max(1.0) as f64
}

/// Narrowest box selection, in pixels, that counts as a zoom.
const MIN_BOX_PX: f32 = 4.0;

/// Time range selected by a box drag between pixels `x0` and `x1`, in either
/// direction. `None` for selections too narrow to be intentional.
pub fn box_zoom_range(x0: f32, x1: f32, range: (f64, f64), left: f32, width: f32) -> Option<(f64, f64)> {
    if (x1 - x0).abs() < MIN_BOX_PX {
        return None;
    }
    let (a, b) = (x0.min(x1), x0.max(x1));
    Some((x_to_time(a, range, left, width), x_to_time(b, range, left, width)))
}

/// Zoom factor for a scroll delta; positive scroll zooms in.
pub fn scroll_zoom_factor(scroll: f32) -> f64 {
    (1.0 - scroll as f64 * 0.001).clamp(0.5, 2.0)
}

/// Y bounds for the points of a sorted series inside `[start, end]`, padded 5%.
/// Flat data gets ±0.5; an empty window gets `[0, 1]`.
pub fn value_bounds(times: &[f64], values: &[f64], start: f64, end: f64) -> (f64, f64) {
    let lo = times.partition_point(|&t| t < start);
    let hi = times.partition_point(|&t| t <= end).max(lo);
    let (min, max) = values[lo..hi]
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(a, b), &v| (a.min(v), b.max(v)));
    padded_bounds(min, max)
}

pub fn padded_bounds(min: f64, max: f64) -> (f64, f64) {
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = (max - min) * 0.05;
    let pad = if pad.abs() < 1e-15 { 0.5 } else { pad };
    (min - pad, max + pad)
}

/// Index of the point nearest in time to `t`.
pub fn nearest_index(times: &[f64], t: f64) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    let pos = times.partition_point(|&v| v < t);
    let candidates = [pos.checked_sub(1), (pos < times.len()).then_some(pos)];
    candidates
        .into_iter()
        .flatten()
        .min_by(|&a, &b| (times[a] - t).abs().total_cmp(&(times[b] - t).abs()))
}

/// Nice grid positions for a value axis.
/// Returns (value, is_major) pairs.
pub fn compute_grid_lines(min: f64, max: f64) -> Vec<(f64, bool)> {
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return Vec::new();
    }

    let raw_step = range / 5.0;
    let order = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / order;

    let nice_step = if normalized <= 1.0 {
        order
    } else if normalized <= 2.0 {
        2.0 * order
    } else if normalized <= 5.0 {
        5.0 * order
    } else {
        10.0 * order
    };

    let minor_step = nice_step / 5.0;
    let start = (min / minor_step).floor() as i64;
    let end = (max / minor_step).ceil() as i64;

    (start..=end)
        .map(|i| i as f64 * minor_step)
        .filter(|val| *val >= min && *val <= max)
        .map(|val| {
            let is_major = ((val / nice_step).round() * nice_step - val).abs() < nice_step * 0.01;
            (val, is_major)
        })
        .collect()
}

/// Tick positions for a time axis, aiming for about `target` ticks.
pub fn time_ticks(start: f64, end: f64, target: usize) -> Vec<f64> {
    let span = end - start;
    if span <= 0.0 || !span.is_finite() || target == 0 {
        return Vec::new();
    }
    let ideal = span / target as f64;
    let step = TIME_STEPS
        .iter()
        .copied()
        .find(|&s| s >= ideal)
        .unwrap_or_else(|| (ideal / (365.0 * DAY)).ceil() * 365.0 * DAY);

    let first = (start / step).ceil() as i64;
    let last = (end / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Format a numeric value for axis tick labels.
pub fn format_tick_value(val: f64) -> String {
    if val.abs() >= 1e6 || (val != 0.0 && val.abs() < 1e-3) {
        format!("{val:.2e}")
    } else if val == 0.0 {
        "0".to_string()
    } else {
        let s = format!("{val:.6}");
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_mapping_round_trips() {
        let range = (1000.0, 2000.0);
        let x = time_to_x(1250.0, range, 100.0, 400.0);
        assert_eq!(x, 200.0);
        assert_eq!(x_to_time(x, range, 100.0, 400.0), 1250.0);
    }

    #[test]
    fn dragging_right_moves_back_in_time() {
        assert_eq!(drag_delta((0.0, 100.0), 50.0, 500.0), -10.0);
    }

    #[test]
    fn box_zoom_selects_span_under_drag() {
        let range = (1000.0, 2000.0);
        assert_eq!(box_zoom_range(300.0, 200.0, range, 100.0, 400.0), Some((1250.0, 1500.0)));
        assert_eq!(box_zoom_range(200.0, 300.0, range, 100.0, 400.0), Some((1250.0, 1500.0)));
        assert_eq!(box_zoom_range(200.0, 202.0, range, 100.0, 400.0), None);
    }

    #[test]
    fn value_bounds_only_use_window() {
        let t = [0.0, 1.0, 2.0, 3.0];
        let v = [100.0, 1.0, 3.0, -100.0];
        let (lo, hi) = value_bounds(&t, &v, 1.0, 2.0);
        assert!((lo - 0.9).abs() < 1e-12 && (hi - 3.1).abs() < 1e-12);
        assert_eq!(value_bounds(&t, &v, 5.0, 6.0), (0.0, 1.0));
        assert_eq!(value_bounds(&t, &v, 1.0, 1.0), (0.5, 1.5));
    }

    #[test]
    fn nearest_picks_closer_neighbour() {
        let t = [0.0, 10.0, 20.0];
        assert_eq!(nearest_index(&t, 14.0), Some(1));
        assert_eq!(nearest_index(&t, 16.0), Some(2));
        assert_eq!(nearest_index(&t, -5.0), Some(0));
        assert_eq!(nearest_index(&t, 99.0), Some(2));
        assert_eq!(nearest_index(&[], 1.0), None);
    }

    #[test]
    fn time_ticks_use_whole_days_for_week_spans() {
        let ticks = time_ticks(0.0, 7.0 * DAY, 8);
        assert_eq!(ticks.len(), 8);
        assert!(ticks.iter().all(|t| t % DAY == 0.0));
    }

    #[test]
    fn tick_values_are_trimmed() {
        assert_eq!(format_tick_value(2.5), "2.5");
        assert_eq!(format_tick_value(0.0), "0");
        assert_eq!(format_tick_value(1.5e7), "1.50e7");
    }
}
