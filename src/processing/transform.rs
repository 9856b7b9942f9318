use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::data::store::Dataset;

/// Per-series value mapping applied before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Transform {
    #[default]
    Identity,
    CumulativeSum,
}

impl Transform {
    pub fn toggled(self) -> Self {
        match self {
            Transform::Identity => Transform::CumulativeSum,
            Transform::CumulativeSum => Transform::Identity,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Transform::Identity => "Raw",
            Transform::CumulativeSum => "Cumulative",
        }
    }

    /// Unit label as shown for values under this transform.
    pub fn display_unit(&self, unit: &str) -> String {
        match self {
            Transform::Identity => unit.to_string(),
            Transform::CumulativeSum => format!("\u{03A3} {unit}"),
        }
    }
}

/// Apply a transform to a value sequence. Output has the input's length and order.
pub fn apply(transform: Transform, raw: &[f64]) -> Vec<f64> {
    match transform {
        Transform::Identity => raw.to_vec(),
        Transform::CumulativeSum => cumulative_sum(raw),
    }
}

/// Running sum where NaN/infinite entries add nothing: `out[i]` is the sum of
/// every finite value at positions `<= i`.
pub fn cumulative_sum(values: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                total += v;
            }
            total
        })
        .collect()
}

/// Derived value buffers, cached per dataset.
///
/// Identity hands out the dataset's own buffer, so switching back to it
/// restores the raw values exactly. Cumulative buffers are computed once and
/// kept for later toggles.
#[derive(Debug, Default)]
pub struct TransformEngine {
    cumulative: HashMap<usize, Arc<[f64]>>,
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the buffer for `transform` is computed and cached.
    pub fn prepare(&mut self, dataset: &Dataset, transform: Transform) {
        if transform == Transform::CumulativeSum {
            self.cumulative
                .entry(dataset.load_index)
                .or_insert_with(|| apply(transform, dataset.values()).into());
        }
    }

    /// Values to display for `dataset` under `transform`. Falls back to
    /// computing on the spot when the cumulative buffer was not prepared.
    pub fn values(&self, dataset: &Dataset, transform: Transform) -> Arc<[f64]> {
        match transform {
            Transform::Identity => Arc::clone(dataset.values()),
            Transform::CumulativeSum => match self.cumulative.get(&dataset.load_index) {
                Some(cached) => Arc::clone(cached),
                None => apply(transform, dataset.values()).into(),
            },
        }
    }

    pub fn cached_count(&self) -> usize {
        self.cumulative.len()
    }
}
