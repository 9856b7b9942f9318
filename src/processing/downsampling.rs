use std::ops::Range;

/// Index range of `times` (sorted ascending) covering `[start, end]`, plus one
/// extra point on each side so lines run off the panel edges.
pub fn window_with_margin(times: &[f64], start: f64, end: f64) -> Range<usize> {
    let lo = times.partition_point(|&t| t < start).saturating_sub(1);
    let hi = (times.partition_point(|&t| t <= end) + 1).min(times.len());
    lo..hi.max(lo)
}

/// Largest-Triangle-Three-Buckets downsampling of a window to at most
/// `target` points. First and last points are always kept.
pub fn lttb(times: &[f64], values: &[f64], target: usize) -> Vec<[f64; 2]> {
    let n = times.len().min(values.len());
    if n <= target || target < 3 {
        return times.iter().zip(values).map(|(&t, &v)| [t, v]).collect();
    }

    let mut out = Vec::with_capacity(target);
    out.push([times[0], values[0]]);

    let bucket_size = (n - 2) as f64 / (target - 2) as f64;
    let mut prev = 0usize;

    for i in 0..(target - 2) {
        let bucket_start = (i as f64 * bucket_size) as usize + 1;
        let bucket_end = (((i as f64 + 1.0) * bucket_size) as usize + 1).min(n - 1);

        // Average of the next bucket is the third triangle vertex.
        let next_start = bucket_end;
        let next_end = (((i as f64 + 2.0) * bucket_size) as usize + 1).min(n);
        let next_count = next_end.saturating_sub(next_start).max(1) as f64;
        let (mut avg_t, mut avg_v) = (0.0, 0.0);
        for j in next_start..next_end {
            avg_t += times[j];
            avg_v += values[j];
        }
        avg_t /= next_count;
        avg_v /= next_count;

        let (pt, pv) = (times[prev], values[prev]);
        let mut best = bucket_start;
        let mut best_area = -1.0f64;
        for j in bucket_start..bucket_end {
            let area = ((pt - avg_t) * (values[j] - pv) - (pt - times[j]) * (avg_v - pv)).abs();
            if area > best_area {
                best_area = area;
                best = j;
            }
        }

        out.push([times[best], values[best]]);
        prev = best;
    }

    out.push([times[n - 1], values[n - 1]]);
    out
}

/// Points of a sorted series to draw for `[start, end]`, capped at `max_points`.
pub fn points_for_view(
    times: &[f64],
    values: &[f64],
    start: f64,
    end: f64,
    max_points: usize,
) -> Vec<[f64; 2]> {
    let window = window_with_margin(times, start, end);
    lttb(&times[window.clone()], &values[window], max_points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_includes_neighbours() {
        let t = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(window_with_margin(&t, 2.0, 3.0), 1..5);
        assert_eq!(window_with_margin(&t, -10.0, 0.5), 0..2);
        assert_eq!(window_with_margin(&t, 10.0, 20.0), 5..6);
    }

    #[test]
    fn lttb_keeps_endpoints_and_peak() {
        let t: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let mut v = vec![0.0; 1000];
        v[500] = 100.0;
        let out = lttb(&t, &v, 50);
        assert_eq!(out.len(), 50);
        assert_eq!(out[0], [0.0, 0.0]);
        assert_eq!(out[49], [999.0, 0.0]);
        assert!(out.iter().any(|p| p[1] == 100.0));
    }

    #[test]
    fn short_series_pass_through() {
        let out = points_for_view(&[1.0, 2.0], &[5.0, 6.0], 0.0, 3.0, 100);
        assert_eq!(out, vec![[1.0, 5.0], [2.0, 6.0]]);
    }
}
