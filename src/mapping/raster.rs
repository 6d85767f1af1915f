//! Obstacle rasterization
//!
//! Turns the current obstacle-return batch into footprints on both grid
//! layers: an elliptical safety footprint on the planning layer and a padded
//! rectangle on the raw layer. Also produces the in-lane obstacle count that
//! feeds the obstacle flag.

use crate::common::frame::GridFrame;
use crate::common::ObstacleReturn;

use super::grid::{GridImage, LaneMask, OBSTACLE_COLOR, OCCUPIED};

/// Gating and footprint-size parameters for the rasterizer
#[derive(Debug, Clone, Copy)]
pub struct RasterSettings {
    /// Half-width of the raw-layer rectangle (cells)
    pub padding_x: i32,

    /// Half-height of the raw-layer rectangle (cells)
    pub padding_y: i32,

    /// Horizontal half-axis of the planning-layer ellipse (cells)
    pub safe_x: i32,

    /// Vertical half-axis of the planning-layer ellipse (cells)
    pub safe_y: i32,

    /// Range gate (m)
    pub min_range: f64,
    pub max_range: f64,

    /// Bearing gate (degrees)
    pub min_theta: f64,
    pub max_theta: f64,
}

/// Rasterizes obstacle returns onto the grid layers
#[derive(Debug, Clone, Copy)]
pub struct ObstacleRasterizer {
    frame: GridFrame,
    settings: RasterSettings,
}

impl ObstacleRasterizer {
    pub fn new(frame: GridFrame, settings: RasterSettings) -> Self {
        ObstacleRasterizer { frame, settings }
    }

    /// Draw one batch of returns on both layers and return the number of
    /// returns that landed inside the drivable lane. Returns outside the
    /// lane are drawn but never counted.
    ///
    /// Iterates in the order the returns were received; drawing is an
    /// idempotent overwrite, so the order only matters for determinism.
    pub fn draw(
        &self,
        returns: &[ObstacleReturn],
        lane: &LaneMask,
        planning: &mut GridImage,
        raw: &mut GridImage,
    ) -> i32 {
        let s = &self.settings;
        let mut obstacle_count = 0;

        for point in returns {
            if !(point.range > s.min_range && point.range < s.max_range) {
                continue;
            }
            let bearing_deg = point.bearing.to_degrees();
            if !(bearing_deg > s.min_theta && bearing_deg < s.max_theta) {
                continue;
            }

            let (cx, cy) = self.frame.to_grid_cell(point.range, point.bearing);
            if !self.frame.in_bounds(cx, cy) {
                continue;
            }

            if lane.value(cx, cy) != OCCUPIED {
                obstacle_count += 1;
            }

            let ((cx1, cy1), (cx2, cy2)) = self.padded_corners(cx, cy);
            planning.fill_ellipse(cx, cy, s.safe_x, s.safe_y, OBSTACLE_COLOR);
            raw.fill_rect(cx1, cy1, cx2, cy2, OBSTACLE_COLOR);
        }

        obstacle_count
    }

    /// Corners of the padded rectangle around a cell. A corner that falls
    /// outside the grid collapses to the center cell itself; the obstacle
    /// cell is always marked.
    fn padded_corners(&self, cx: i32, cy: i32) -> ((i32, i32), (i32, i32)) {
        let s = &self.settings;
        let low_in = self.frame.in_bounds(cx - s.padding_x, cy - s.padding_y);
        let high_in = self.frame.in_bounds(cx + s.padding_x, cy + s.padding_y);
        match (low_in, high_in) {
            (true, true) => (
                (cx - s.padding_x, cy - s.padding_y),
                (cx + s.padding_x, cy + s.padding_y),
            ),
            (true, false) => ((cx - s.padding_x, cy - s.padding_y), (cx, cy)),
            (false, true) => ((cx, cy), (cx + s.padding_x, cy + s.padding_y)),
            (false, false) => ((cx, cy), (cx, cy)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> GridFrame {
        GridFrame::new(200, 200, 0.1, 1.0)
    }

    fn settings() -> RasterSettings {
        RasterSettings {
            padding_x: 4,
            padding_y: 4,
            safe_x: 6,
            safe_y: 6,
            min_range: 1.0,
            max_range: 10.0,
            min_theta: -90.0,
            max_theta: 90.0,
        }
    }

    fn blank() -> (LaneMask, GridImage, GridImage) {
        let mask = LaneMask::new(200, 200);
        let planning = GridImage::from_mask(&mask);
        let raw = GridImage::from_mask(&mask);
        (mask, planning, raw)
    }

    #[test]
    fn gated_out_returns_leave_the_raster_untouched() {
        let rasterizer = ObstacleRasterizer::new(frame(), settings());
        let (mask, mut planning, mut raw) = blank();
        let before = planning.clone();
        let gated = [
            ObstacleReturn { range: 0.5, bearing: 0.0 },   // below range gate
            ObstacleReturn { range: 15.0, bearing: 0.0 },  // above range gate
            ObstacleReturn { range: 5.0, bearing: 2.0 },   // ~114 deg, outside gate
            ObstacleReturn { range: 5.0, bearing: -2.0 },
        ];
        let count = rasterizer.draw(&gated, &mask, &mut planning, &mut raw);
        assert_eq!(count, 0);
        assert_eq!(planning, before);
        assert_eq!(raw, before);
    }

    #[test]
    fn in_lane_return_is_counted_and_drawn() {
        let rasterizer = ObstacleRasterizer::new(frame(), settings());
        let (mask, mut planning, mut raw) = blank();
        let batch = [ObstacleReturn { range: 5.0, bearing: 0.0 }];
        let count = rasterizer.draw(&batch, &mask, &mut planning, &mut raw);
        assert_eq!(count, 1);
        let (cx, cy) = frame().to_grid_cell(5.0, 0.0);
        assert_eq!((cx, cy), (150, 190));
        assert_eq!(planning.channel0(cx, cy), OCCUPIED);
        assert_eq!(raw.channel0(cx, cy), OCCUPIED);
        // elliptical footprint extends past the rectangle padding
        assert_eq!(planning.channel0(cx + 6, cy), OCCUPIED);
        assert_eq!(raw.channel0(cx + 6, cy), 0);
        assert_eq!(raw.channel0(cx + 4, cy + 4), OCCUPIED);
    }

    #[test]
    fn return_outside_the_lane_is_drawn_but_not_counted() {
        let rasterizer = ObstacleRasterizer::new(frame(), settings());
        let (mut mask, _, _) = blank();
        let (cx, cy) = frame().to_grid_cell(5.0, 0.0);
        mask.set(cx, cy, OCCUPIED);
        let mut planning = GridImage::from_mask(&mask);
        let mut raw = GridImage::from_mask(&mask);
        let batch = [ObstacleReturn { range: 5.0, bearing: 0.0 }];
        let count = rasterizer.draw(&batch, &mask, &mut planning, &mut raw);
        assert_eq!(count, 0);
        assert_eq!(planning.channel0(cx, cy), OCCUPIED);
    }

    #[test]
    fn out_of_grid_projection_is_dropped_silently() {
        // bearing just inside the gate, range close to the gate edge: the
        // projection lands below the grid and must be ignored
        let rasterizer = ObstacleRasterizer::new(frame(), settings());
        let (mask, mut planning, mut raw) = blank();
        let before = planning.clone();
        let batch = [ObstacleReturn { range: 9.9, bearing: -1.5 }];
        let (cx, cy) = frame().to_grid_cell(9.9, -1.5);
        assert!(!frame().in_bounds(cx, cy));
        let count = rasterizer.draw(&batch, &mask, &mut planning, &mut raw);
        assert_eq!(count, 0);
        assert_eq!(planning, before);
        assert_eq!(raw, before);
    }

    #[test]
    fn rasterizing_twice_equals_rasterizing_once() {
        let rasterizer = ObstacleRasterizer::new(frame(), settings());
        let (mask, mut planning, mut raw) = blank();
        let batch = [ObstacleReturn { range: 5.0, bearing: 0.3 }];
        rasterizer.draw(&batch, &mask, &mut planning, &mut raw);
        let planning_once = planning.clone();
        let raw_once = raw.clone();
        rasterizer.draw(&batch, &mask, &mut planning, &mut raw);
        assert_eq!(planning, planning_once);
        assert_eq!(raw, raw_once);
    }

    #[test]
    fn rectangle_collapses_per_corner_near_the_border() {
        let mut wide = settings();
        wide.padding_x = 50;
        wide.padding_y = 50;
        let rasterizer = ObstacleRasterizer::new(frame(), wide);
        let (mask, mut planning, mut raw) = blank();
        // projects near the right edge: the far corner of the padded
        // rectangle leaves the grid, the near corner does not
        let batch = [ObstacleReturn { range: 5.5, bearing: 0.45 }];
        let (cx, cy) = frame().to_grid_cell(5.5, 0.45);
        assert!(frame().in_bounds(cx, cy));
        assert!(frame().in_bounds(cx - 50, cy - 50));
        assert!(!frame().in_bounds(cx + 50, cy + 50));
        rasterizer.draw(&batch, &mask, &mut planning, &mut raw);
        // the rectangle spans from the near corner to the center cell only
        assert_eq!(raw.channel0(cx, cy), OCCUPIED);
        assert_eq!(raw.channel0(cx - 50, cy - 50), OCCUPIED);
        assert_eq!(raw.channel0(cx + 2, cy + 2), 0);
    }
}
