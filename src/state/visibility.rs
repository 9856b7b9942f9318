use crate::processing::transform::Transform;

/// Per-dataset interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeriesViewState {
    pub visible: bool,
    pub transform: Transform,
    /// Position among visible series. Hidden series keep their last value,
    /// which is not used for anything.
    pub order_index: usize,
}

/// Owns which datasets are selected and the order they are stacked in.
///
/// Datasets are addressed by load index. `order` holds exactly the visible
/// datasets, top panel first.
#[derive(Debug, Clone, Default)]
pub struct VisibilityOrder {
    states: Vec<SeriesViewState>,
    order: Vec<usize>,
}

impl VisibilityOrder {
    pub fn new(dataset_count: usize) -> Self {
        Self {
            states: vec![SeriesViewState::default(); dataset_count],
            order: Vec::new(),
        }
    }

    pub fn state(&self, index: usize) -> Option<&SeriesViewState> {
        self.states.get(index)
    }

    /// Visible datasets, top to bottom.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn visible_count(&self) -> usize {
        self.order.len()
    }

    /// Show or hide a dataset. Newly shown datasets go to the bottom.
    /// Returns whether the visible set changed.
    pub fn set_visible(&mut self, index: usize, visible: bool) -> bool {
        let Some(state) = self.states.get_mut(index) else {
            return false;
        };
        if state.visible == visible {
            return false;
        }
        state.visible = visible;
        if visible {
            self.order.push(index);
        } else {
            self.order.retain(|&i| i != index);
        }
        self.renumber();
        true
    }

    /// Swap with the visible neighbor above. No-op at the top or when hidden.
    pub fn move_up(&mut self, index: usize) -> bool {
        match self.position(index) {
            Some(pos) if pos > 0 => {
                self.order.swap(pos, pos - 1);
                self.renumber();
                true
            }
            _ => false,
        }
    }

    /// Swap with the visible neighbor below. No-op at the bottom or when hidden.
    pub fn move_down(&mut self, index: usize) -> bool {
        match self.position(index) {
            Some(pos) if pos + 1 < self.order.len() => {
                self.order.swap(pos, pos + 1);
                self.renumber();
                true
            }
            _ => false,
        }
    }

    /// Flip Identity/CumulativeSum for one dataset. Returns the new transform.
    pub fn toggle_transform(&mut self, index: usize) -> Option<Transform> {
        let state = self.states.get_mut(index)?;
        state.transform = state.transform.toggled();
        Some(state.transform)
    }

    fn position(&self, index: usize) -> Option<usize> {
        self.order.iter().position(|&i| i == index)
    }

    fn renumber(&mut self) {
        for (pos, &index) in self.order.iter().enumerate() {
            self.states[index].order_index = pos;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible_indices(v: &VisibilityOrder) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..v.states.len())
            .filter_map(|i| v.state(i).filter(|s| s.visible).map(|s| s.order_index))
            .collect();
        idx.sort_unstable();
        idx
    }

    #[test]
    fn order_indices_stay_contiguous() {
        let mut v = VisibilityOrder::new(6);
        let ops: &[(&str, usize)] = &[
            ("on", 3), ("on", 0), ("on", 5), ("up", 5), ("off", 0), ("on", 1),
            ("down", 3), ("on", 0), ("off", 5), ("up", 0), ("up", 0), ("off", 3),
            ("down", 1), ("on", 4), ("off", 4), ("on", 2),
        ];
        for &(op, i) in ops {
            match op {
                "on" => {
                    v.set_visible(i, true);
                }
                "off" => {
                    v.set_visible(i, false);
                }
                "up" => {
                    v.move_up(i);
                }
                _ => {
                    v.move_down(i);
                }
            }
            let n = v.visible_count();
            assert_eq!(visible_indices(&v), (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn reshown_dataset_goes_to_bottom() {
        let mut v = VisibilityOrder::new(3);
        v.set_visible(0, true);
        v.set_visible(1, true);
        v.set_visible(2, true);
        v.set_visible(0, false);
        v.set_visible(0, true);
        assert_eq!(v.order(), &[1, 2, 0]);
    }

    #[test]
    fn boundary_moves_are_noops() {
        let mut v = VisibilityOrder::new(3);
        v.set_visible(2, true);
        v.set_visible(0, true);
        assert!(!v.move_up(2));
        assert!(!v.move_down(0));
        assert!(!v.move_up(1)); // hidden
        assert_eq!(v.order(), &[2, 0]);
        assert!(v.move_down(2));
        assert_eq!(v.order(), &[0, 2]);
    }

    #[test]
    fn repeated_set_visible_reports_no_change() {
        let mut v = VisibilityOrder::new(2);
        assert!(v.set_visible(1, true));
        assert!(!v.set_visible(1, true));
        assert!(!v.set_visible(0, false));
        assert!(!v.set_visible(7, true));
    }

    #[test]
    fn toggle_touches_one_dataset_only() {
        let mut v = VisibilityOrder::new(3);
        v.set_visible(0, true);
        v.set_visible(1, true);
        let before: Vec<_> = (0..3).map(|i| *v.state(i).unwrap()).collect();
        assert_eq!(v.toggle_transform(1), Some(Transform::CumulativeSum));
        for i in [0, 2] {
            assert_eq!(*v.state(i).unwrap(), before[i]);
        }
        assert_eq!(v.order(), &[0, 1]);
        assert_eq!(v.state(1).unwrap().order_index, before[1].order_index);
    }
}
