//! Common types shared across the Helios stacks

pub mod frame;

/// One ranged obstacle return from the range sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleReturn {
    /// Distance from the sensor (m), non-negative
    pub range: f64,

    /// Bearing in the sensor frame (rad)
    pub bearing: f64,
}

/// A pose in grid coordinates with a heading in (0, 2pi]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Pose { x, y, heading }
    }
}

/// Goal point emitted on the planning-target channel.
///
/// `x` carries the target row and `y` the target column: the coordinates are
/// swapped to match the downstream planner's convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
