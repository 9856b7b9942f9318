//! Shared time range for every visible panel.
//!
//! The controller has two modes. `AutoFit` tracks the padded union of the
//! visible datasets' bounds; any pan or zoom switches to `Manual`, and the
//! next change to the visible set switches back to `AutoFit` unconditionally.

/// Fraction of the union span added on each side when auto-fitting.
pub const AUTO_FIT_PADDING: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportMode {
    AutoFit,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub start: f64,
    pub end: f64,
    pub mode: ViewportMode,
}

impl Viewport {
    pub fn range(&self) -> (f64, f64) {
        (self.start, self.end)
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn auto_fit_enabled(&self) -> bool {
        self.mode == ViewportMode::AutoFit
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
            mode: ViewportMode::AutoFit,
        }
    }
}

/// Union of `bounds` widened by [`AUTO_FIT_PADDING`] of its span on each side.
pub fn padded_union(bounds: impl IntoIterator<Item = (f64, f64)>) -> Option<(f64, f64)> {
    let (min, max) = bounds
        .into_iter()
        .filter(|(lo, hi)| lo.is_finite() && hi.is_finite())
        .reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))?;
    let padding = AUTO_FIT_PADDING * (max - min);
    Some((min - padding, max + padding))
}

#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    viewport: Viewport,
}

impl ViewportController {
    /// Start in auto-fit over `bounds` (normally every loaded dataset).
    pub fn new(bounds: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut viewport = Viewport::default();
        if let Some((start, end)) = padded_union(bounds) {
            viewport.start = start;
            viewport.end = end;
        }
        Self { viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// The visible set changed: back to auto-fit over the new set. With
    /// nothing visible the previous range is kept.
    pub fn on_visibility_changed(&mut self, visible_bounds: impl IntoIterator<Item = (f64, f64)>) {
        self.viewport.mode = ViewportMode::AutoFit;
        if let Some((start, end)) = padded_union(visible_bounds) {
            self.viewport.start = start;
            self.viewport.end = end;
        }
        tracing::debug!(
            "viewport auto-fit to [{}, {}]",
            self.viewport.start,
            self.viewport.end
        );
    }

    /// User pan or zoom to an explicit range. Reversed ranges are normalised;
    /// non-finite ones are ignored. Returns whether the request was applied.
    pub fn set_manual(&mut self, start: f64, end: f64) -> bool {
        if !start.is_finite() || !end.is_finite() {
            tracing::warn!("ignoring non-finite viewport request [{start}, {end}]");
            return false;
        }
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.viewport = Viewport {
            start,
            end,
            mode: ViewportMode::Manual,
        };
        true
    }

    /// Range after shifting the current one by `delta` seconds.
    pub fn pan_by(&self, delta: f64) -> (f64, f64) {
        (self.viewport.start + delta, self.viewport.end + delta)
    }

    /// Range after scaling the current one by `factor` about `center`.
    /// `factor < 1` zooms in.
    pub fn zoom_about(&self, center: f64, factor: f64) -> (f64, f64) {
        let factor = factor.clamp(0.5, 2.0);
        (
            center + (self.viewport.start - center) * factor,
            center + (self.viewport.end - center) * factor,
        )
    }

    /// Explicit reset: auto-fit to the current visible set.
    pub fn reset(&mut self, visible_bounds: impl IntoIterator<Item = (f64, f64)>) {
        self.on_visibility_changed(visible_bounds);
    }
}
