use std::sync::Arc;

use crate::data::store::SeriesStore;
use crate::processing::transform::{Transform, TransformEngine};
use crate::state::viewport::Viewport;
use crate::state::visibility::VisibilityOrder;

/// Everything needed to draw one panel.
#[derive(Debug, Clone)]
pub struct RenderDescriptor {
    pub name: String,
    /// Unit adjusted for the transform (`Σ mm` when cumulative).
    pub unit: String,
    pub transform: Transform,
    pub color: [u8; 4],
    /// Panel slot, top = 0.
    pub position: usize,
    pub times: Arc<[f64]>,
    pub values: Arc<[f64]>,
}

impl RenderDescriptor {
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.unit)
    }

    pub fn point_count(&self) -> usize {
        self.times.len()
    }

    /// Points with `start <= t <= end`.
    pub fn points_in(&self, start: f64, end: f64) -> Vec<(f64, f64)> {
        let lo = self.times.partition_point(|&t| t < start);
        let hi = self.times.partition_point(|&t| t <= end);
        if lo >= hi {
            return Vec::new();
        }
        self.times[lo..hi]
            .iter()
            .copied()
            .zip(self.values[lo..hi].iter().copied())
            .collect()
    }
}

/// Ordered descriptors plus the range they share.
#[derive(Debug, Clone)]
pub struct Projection {
    pub descriptors: Vec<RenderDescriptor>,
    pub viewport: Viewport,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Derive the panels to draw. Pure: reads state, never changes it, and
/// never filters by time (the interactive layer windows on its own).
pub fn project(
    store: &SeriesStore,
    views: &VisibilityOrder,
    transforms: &TransformEngine,
    viewport: Viewport,
) -> Projection {
    let descriptors = views
        .order()
        .iter()
        .enumerate()
        .filter_map(|(position, &index)| {
            let dataset = store.by_index(index)?;
            let transform = views.state(index)?.transform;
            Some(RenderDescriptor {
                name: dataset.name.clone(),
                unit: transform.display_unit(&dataset.unit),
                transform,
                color: dataset.color,
                position,
                times: Arc::clone(dataset.times()),
                values: transforms.values(dataset, transform),
            })
        })
        .collect();

    Projection {
        descriptors,
        viewport,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::IngestedSeries;

    fn store() -> SeriesStore {
        let series = |name: &str, unit: &str| IngestedSeries {
            name: name.into(),
            unit: unit.into(),
            times: vec![0.0, 10.0, 20.0, 30.0],
            values: vec![1.0, 2.0, 3.0, 4.0],
        };
        SeriesStore::from_series(vec![series("A", "bar"), series("B", "mm"), series("C", "K")])
    }

    #[test]
    fn follows_display_order_not_load_order() {
        let store = store();
        let mut views = VisibilityOrder::new(store.len());
        views.set_visible(2, true);
        views.set_visible(0, true);
        views.toggle_transform(0);

        let p = project(&store, &views, &TransformEngine::new(), Viewport::default());
        let names: Vec<&str> = p.descriptors.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A"]);
        assert_eq!(p.descriptors[1].position, 1);
        assert_eq!(p.descriptors[1].unit, "\u{03A3} bar");
        assert_eq!(&p.descriptors[1].values[..], &[1.0, 3.0, 6.0, 10.0]);
        assert_eq!(p.descriptors[0].color, store.get("C").unwrap().color);
        // interactive path is never time-filtered
        assert_eq!(p.descriptors[0].point_count(), 4);
    }

    #[test]
    fn points_in_is_inclusive() {
        let store = store();
        let mut views = VisibilityOrder::new(store.len());
        views.set_visible(1, true);
        let p = project(&store, &views, &TransformEngine::new(), Viewport::default());
        let d = &p.descriptors[0];
        assert_eq!(d.points_in(10.0, 20.0), vec![(10.0, 2.0), (20.0, 3.0)]);
        assert!(d.points_in(31.0, 40.0).is_empty());
        assert!(d.points_in(20.0, 10.0).is_empty());
    }
}
