use crate::data::store::{Dataset, SeriesStore};
use crate::error::NotFoundError;
use crate::render::projection::{self, Projection};
use crate::processing::transform::TransformEngine;
use crate::state::viewport::{Viewport, ViewportController};
use crate::state::visibility::{SeriesViewState, VisibilityOrder};

/// A user action, addressed by dataset name where it targets one dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    SetVisible { name: String, visible: bool },
    MoveUp(String),
    MoveDown(String),
    ToggleTransform(String),
    /// Pan or zoom to an explicit time range.
    SetRange { start: f64, end: f64 },
    ResetView,
}

/// All mutable state of one interactive session.
///
/// Handlers run to completion one at a time; nothing here is shared across
/// threads. Exports work from a [`Projection`] snapshot instead.
#[derive(Debug)]
pub struct Session {
    store: SeriesStore,
    views: VisibilityOrder,
    viewport: ViewportController,
    transforms: TransformEngine,
}

impl Session {
    /// Start with every dataset hidden and the viewport fitted to all of
    /// them, then select `initial` in the given order. Unknown names in
    /// `initial` are logged and skipped.
    pub fn new(store: SeriesStore, initial: &[String]) -> Self {
        let views = VisibilityOrder::new(store.len());
        let viewport = ViewportController::new(store.time_bounds());
        let mut session = Self {
            store,
            views,
            viewport,
            transforms: TransformEngine::new(),
        };
        for name in initial {
            if let Err(e) = session.set_visible(name, true) {
                tracing::warn!("Default selection: {e}");
            }
        }
        session
    }

    pub fn dispatch(&mut self, action: SessionAction) -> Result<(), NotFoundError> {
        match action {
            SessionAction::SetVisible { name, visible } => self.set_visible(&name, visible),
            SessionAction::MoveUp(name) => self.move_up(&name),
            SessionAction::MoveDown(name) => self.move_down(&name),
            SessionAction::ToggleTransform(name) => self.toggle_transform(&name),
            SessionAction::SetRange { start, end } => {
                self.viewport.set_manual(start, end);
                Ok(())
            }
            SessionAction::ResetView => {
                let bounds = self.visible_bounds();
                self.viewport.reset(bounds);
                Ok(())
            }
        }
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<(), NotFoundError> {
        let index = self.store.index_of(name)?;
        if self.views.set_visible(index, visible) {
            let bounds = self.visible_bounds();
            self.viewport.on_visibility_changed(bounds);
        }
        Ok(())
    }

    pub fn move_up(&mut self, name: &str) -> Result<(), NotFoundError> {
        let index = self.store.index_of(name)?;
        self.views.move_up(index);
        Ok(())
    }

    pub fn move_down(&mut self, name: &str) -> Result<(), NotFoundError> {
        let index = self.store.index_of(name)?;
        self.views.move_down(index);
        Ok(())
    }

    pub fn toggle_transform(&mut self, name: &str) -> Result<(), NotFoundError> {
        let index = self.store.index_of(name)?;
        if let Some(transform) = self.views.toggle_transform(index) {
            let dataset = self.store.get(name)?;
            self.transforms.prepare(dataset, transform);
            tracing::debug!(
                "{name} now {} ({} cumulative buffers cached)",
                transform.label(),
                self.transforms.cached_count()
            );
        }
        Ok(())
    }

    pub fn project(&self) -> Projection {
        projection::project(&self.store, &self.views, &self.transforms, self.viewport.viewport())
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport.viewport()
    }

    pub fn viewport_controller(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn view_state(&self, name: &str) -> Result<SeriesViewState, NotFoundError> {
        let index = self.store.index_of(name)?;
        self.views
            .state(index)
            .copied()
            .ok_or_else(|| NotFoundError(name.to_string()))
    }

    /// Visible dataset names, top to bottom.
    pub fn display_order(&self) -> Vec<String> {
        self.views
            .order()
            .iter()
            .filter_map(|&i| self.store.by_index(i).map(|d| d.name.clone()))
            .collect()
    }

    fn visible_bounds(&self) -> Vec<(f64, f64)> {
        self.views
            .order()
            .iter()
            .filter_map(|&i| self.store.by_index(i).map(Dataset::bounds))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::IngestedSeries;
    use crate::processing::transform::Transform;

    fn session(initial: &[&str]) -> Session {
        let series = |name: &str, t0: f64, t1: f64| IngestedSeries {
            name: name.into(),
            unit: "u".into(),
            times: vec![t0, t1],
            values: vec![1.0, f64::NAN],
        };
        let store = SeriesStore::from_series(vec![
            series("Pressure", 0.0, 100.0),
            series("Rain", 50.0, 250.0),
            series("Tides", 1000.0, 2000.0),
        ]);
        let initial: Vec<String> = initial.iter().map(|s| s.to_string()).collect();
        Session::new(store, &initial)
    }

    #[test]
    fn startup_fits_initial_selection() {
        let s = session(&["Pressure", "Rain"]);
        assert_eq!(s.display_order(), vec!["Pressure", "Rain"]);
        assert_eq!(s.viewport().range(), (-5.0, 255.0));
    }

    #[test]
    fn unknown_names_are_errors() {
        let mut s = session(&["Nope"]);
        assert!(s.display_order().is_empty());
        let err = s.dispatch(SessionAction::MoveUp("Ghost".into())).unwrap_err();
        assert_eq!(err, NotFoundError("Ghost".into()));
        assert!(s.view_state("Ghost").is_err());
    }

    #[test]
    fn manual_range_lasts_until_selection_changes() {
        let mut s = session(&["Pressure"]);
        s.dispatch(SessionAction::SetRange { start: 10.0, end: 20.0 }).unwrap();
        assert_eq!(s.viewport().range(), (10.0, 20.0));
        assert!(!s.viewport().auto_fit_enabled());

        // reorder and transform do not touch the viewport
        s.dispatch(SessionAction::ToggleTransform("Pressure".into())).unwrap();
        assert_eq!(s.viewport().range(), (10.0, 20.0));

        s.dispatch(SessionAction::SetVisible { name: "Tides".into(), visible: true }).unwrap();
        assert!(s.viewport().auto_fit_enabled());
        assert_eq!(s.viewport().range(), (-40.0, 2040.0));
    }

    #[test]
    fn reset_view_refits_without_selection_change() {
        let mut s = session(&["Rain"]);
        s.dispatch(SessionAction::SetRange { start: 0.0, end: 1.0 }).unwrap();
        s.dispatch(SessionAction::ResetView).unwrap();
        assert_eq!(s.viewport().range(), (46.0, 254.0));
    }

    #[test]
    fn hiding_everything_keeps_last_range() {
        let mut s = session(&["Rain"]);
        let before = s.viewport().range();
        s.set_visible("Rain", false).unwrap();
        assert_eq!(s.viewport().range(), before);
        assert!(s.project().is_empty());
    }

    #[test]
    fn toggle_round_trip_restores_projection_values() {
        let mut s = session(&["Rain"]);
        s.toggle_transform("Rain").unwrap();
        assert_eq!(s.view_state("Rain").unwrap().transform, Transform::CumulativeSum);
        assert_eq!(&s.project().descriptors[0].values[..], &[1.0, 1.0]);
        s.toggle_transform("Rain").unwrap();
        let values = s.project().descriptors[0].values.clone();
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
    }
}
