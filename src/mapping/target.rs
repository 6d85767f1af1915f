//! Target selection
//!
//! Chooses the planner goal cell: the grid-width midpoint at the farthest
//! row. The selector does not search for an alternate free cell when that
//! cell is occupied; it stamps a diagnostic marker and emits the same
//! coordinates regardless.

use crate::common::TargetPoint;

use super::grid::{GridImage, OCCUPIED, TARGET_MARKER_COLOR};

/// Selects the planner goal cell
#[derive(Debug, Clone, Copy)]
pub struct TargetSelector {
    width: i32,
}

impl TargetSelector {
    pub fn new(width: i32) -> Self {
        TargetSelector { width }
    }

    /// The target cell as (column, row)
    pub fn target_cell(&self) -> (i32, i32) {
        (self.width / 2, 1)
    }

    /// Pick the target, stamping a diagnostic circle on the raw layer when
    /// the chosen cell is already occupied. The emitted point swaps x and y
    /// to match the downstream planner's coordinate convention.
    pub fn select(&self, _flag_obstacle: i32, raw: &mut GridImage) -> TargetPoint {
        let (target_x, target_y) = self.target_cell();
        if raw.channel0(target_x, target_y) == OCCUPIED {
            tracing::debug!(
                col = target_x,
                row = target_y,
                "target cell is not in the free region"
            );
            raw.fill_circle(target_x, target_y, 3, TARGET_MARKER_COLOR);
        }
        TargetPoint {
            x: target_y as f64,
            y: target_x as f64,
            z: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::grid::OBSTACLE_COLOR;

    #[test]
    fn emits_swapped_coordinates() {
        let selector = TargetSelector::new(200);
        let mut raw = GridImage::new(200, 200);
        let target = selector.select(0, &mut raw);
        assert_eq!(target.x, 1.0);
        assert_eq!(target.y, 100.0);
        assert_eq!(target.z, 0.0);
    }

    #[test]
    fn free_target_cell_stays_unmarked() {
        let selector = TargetSelector::new(200);
        let mut raw = GridImage::new(200, 200);
        let before = raw.clone();
        selector.select(0, &mut raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn occupied_target_cell_is_marked_but_still_emitted() {
        let selector = TargetSelector::new(200);
        let mut raw = GridImage::new(200, 200);
        raw.fill_rect(95, 0, 105, 5, OBSTACLE_COLOR);
        let target = selector.select(3, &mut raw);
        // same coordinates as the free case, no alternate cell search
        assert_eq!(target.x, 1.0);
        assert_eq!(target.y, 100.0);
        // diagnostic marker was stamped around the cell
        assert_eq!(raw.pixel(100, 1), TARGET_MARKER_COLOR);
    }
}
