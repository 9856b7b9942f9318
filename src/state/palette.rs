/// Category10, used while ten or fewer datasets are loaded.
pub const CATEGORY10: [[u8; 4]; 10] = [
    [31, 119, 180, 255],  // Blue
    [255, 127, 14, 255],  // Orange
    [44, 160, 44, 255],   // Green
    [214, 39, 40, 255],   // Red
    [148, 103, 189, 255], // Purple
    [140, 86, 75, 255],   // Brown
    [227, 119, 194, 255], // Pink
    [127, 127, 127, 255], // Gray
    [188, 189, 34, 255],  // Olive
    [23, 190, 207, 255],  // Cyan
];

/// Color for the dataset at `load_index` out of `loaded` datasets.
///
/// Depends only on load order, never on display order, so a series keeps its
/// color through reordering and visibility toggles.
pub fn color_for_dataset(load_index: usize, loaded: usize) -> [u8; 4] {
    if loaded <= CATEGORY10.len() {
        CATEGORY10[load_index % CATEGORY10.len()]
    } else {
        // Evenly spaced samples of a 256-entry Turbo table.
        let slot = (load_index % loaded) * 256 / loaded;
        turbo(slot as f64 / 255.0)
    }
}

/// Polynomial approximation of the Turbo colormap, `t` in `[0, 1]`.
fn turbo(t: f64) -> [u8; 4] {
    let x = t.clamp(0.0, 1.0);
    let r = 0.13572138
        + x * (4.61539260 + x * (-42.66032258 + x * (132.13108234 + x * (-152.94239396 + x * 59.28637943))));
    let g = 0.09140261
        + x * (2.19418839 + x * (4.84296658 + x * (-14.18503333 + x * (4.27729857 + x * 2.82956604))));
    let b = 0.10667330
        + x * (12.64194608 + x * (-60.58204836 + x * (110.36276771 + x * (-89.90310912 + x * 27.34824973))));
    let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(r), channel(g), channel(b), 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_sets_use_category10() {
        assert_eq!(color_for_dataset(0, 2), CATEGORY10[0]);
        assert_eq!(color_for_dataset(9, 10), CATEGORY10[9]);
    }

    #[test]
    fn large_sets_get_distinct_turbo_samples() {
        let colors: Vec<[u8; 4]> = (0..16).map(|i| color_for_dataset(i, 16)).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
