//! Coordinate-frame conversions
//!
//! Converts between polar sensor space, metric vehicle-centered space, and
//! grid pixel space. Row 0 of the grid is the far end of the field of view;
//! the sensor mounts `sensor_offset` meters ahead of the vehicle reference
//! point, which is why the vertical axis is flipped and shifted.

use nalgebra::Vector2;
use std::f64::consts::TAU;

/// Grid geometry shared by every frame conversion
#[derive(Debug, Clone, Copy)]
pub struct GridFrame {
    /// Grid width in cells
    pub width: i32,

    /// Grid height in cells
    pub height: i32,

    /// Metric size of one cell (m/cell)
    pub resolution: f64,

    /// Distance from the vehicle reference point to the sensor mount (m)
    pub sensor_offset: f64,
}

impl GridFrame {
    pub fn new(width: i32, height: i32, resolution: f64, sensor_offset: f64) -> Self {
        GridFrame {
            width,
            height,
            resolution,
            sensor_offset,
        }
    }

    /// Project a polar sensor return onto a grid cell.
    pub fn to_grid_cell(&self, range: f64, bearing: f64) -> (i32, i32) {
        let metric = Vector2::new(range * bearing.cos(), range * bearing.sin());
        let cx = self.width / 2 + (metric.x / self.resolution).round() as i32;
        let cy = self.height - ((metric.y + self.sensor_offset) / self.resolution).round() as i32;
        (cx, cy)
    }

    /// The cell the sensor itself occupies.
    pub fn sensor_cell(&self) -> (i32, i32) {
        (
            self.width / 2,
            self.height - (self.sensor_offset / self.resolution) as i32,
        )
    }

    /// True iff the cell lies strictly inside the grid, border excluded.
    /// Every raster write and read is gated through this; an out-of-bounds
    /// access is a programming error, not a recoverable condition.
    pub fn in_bounds(&self, cx: i32, cy: i32) -> bool {
        cx > 0 && cx < self.width - 1 && cy > 0 && cy < self.height - 1
    }
}

/// Map any heading onto (0, 2pi], preserving the physical direction.
///
/// Zero rolls to 2pi so discretization into heading bins never indexes
/// bin -1 or wraps ambiguously.
pub fn normalize_heading(theta: f64) -> f64 {
    let mut t = theta % TAU;
    if t <= 0.0 {
        t += TAU;
    }
    t
}
