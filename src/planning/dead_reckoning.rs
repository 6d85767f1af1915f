//! Dead-reckoning start-pose estimation
//!
//! The planner receives no odometry. The start pose in each new grid is
//! estimated from nominal speed, a nominal steering delta, the wheelbase,
//! and the time elapsed since the previous grid became available (bicycle
//! kinematic approximation). The vehicle never sits at the previous grid's
//! origin: it kept moving during the inter-update interval.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Vector2;

use crate::common::frame::{normalize_heading, GridFrame};
use crate::common::Pose;

/// Bicycle-model start-pose estimator
#[derive(Debug, Clone, Copy)]
pub struct DeadReckoning {
    /// Nominal forward speed (m/s)
    pub velocity: f64,

    /// Nominal steering delta (rad)
    pub steer_delta: f64,

    /// Vehicle wheelbase (m)
    pub wheelbase: f64,

    frame: GridFrame,
}

impl DeadReckoning {
    pub fn new(velocity: f64, steer_delta: f64, wheelbase: f64, frame: GridFrame) -> Self {
        DeadReckoning {
            velocity,
            steer_delta,
            wheelbase,
            frame,
        }
    }

    /// Estimate where the vehicle now sits in the new grid's frame, given
    /// the seconds elapsed since the previous grid became available.
    pub fn estimate_start(&self, dt: f64) -> Pose {
        let yaw_delta = self.velocity * self.steer_delta * dt / self.wheelbase;
        let half_width = (self.frame.width / 2) as f64;
        let height = self.frame.height as f64;
        let resolution = self.frame.resolution;

        if yaw_delta != 0.0 {
            // displacement of the rear axle along the turning arc, metric
            let arc = Vector2::new(
                self.wheelbase * (1.0 - yaw_delta.cos()) / self.steer_delta,
                self.wheelbase * yaw_delta.sin() / self.steer_delta,
            );
            Pose {
                x: half_width - arc.x / resolution,
                y: height - arc.y / resolution,
                heading: normalize_heading(yaw_delta + FRAC_PI_2 + PI),
            }
        } else {
            Pose {
                x: half_width,
                y: height - self.velocity * dt / resolution,
                heading: normalize_heading(FRAC_PI_2 + PI),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn estimator() -> DeadReckoning {
        DeadReckoning::new(
            10.0,
            PI / 10.0,
            1.6,
            GridFrame::new(200, 200, 0.1, 1.0),
        )
    }

    #[test]
    fn zero_elapsed_time_degenerates_to_the_grid_bottom() {
        let start = estimator().estimate_start(0.0);
        assert_relative_eq!(start.x, 100.0);
        assert_relative_eq!(start.y, 200.0);
        assert_relative_eq!(start.heading, FRAC_PI_2 + PI);
    }

    #[test]
    fn straight_case_is_pure_forward_displacement() {
        let mut dr = estimator();
        dr.steer_delta = 0.0; // yaw delta vanishes
        let start = dr.estimate_start(0.5);
        assert_relative_eq!(start.x, 100.0);
        assert_relative_eq!(start.y, 200.0 - 10.0 * 0.5 / 0.1);
        assert_relative_eq!(start.heading, FRAC_PI_2 + PI);
    }

    #[test]
    fn curved_case_matches_the_bicycle_arc() {
        let dr = estimator();
        let dt = 0.1;
        let yaw_delta = 10.0 * (PI / 10.0) * dt / 1.6;
        let start = dr.estimate_start(dt);
        assert_relative_eq!(
            start.x,
            100.0 - (1.6 * (1.0 - yaw_delta.cos()) / (PI / 10.0)) / 0.1,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            start.y,
            200.0 - (1.6 * yaw_delta.sin() / (PI / 10.0)) / 0.1,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            start.heading,
            normalize_heading(yaw_delta + FRAC_PI_2 + PI),
            epsilon = 1e-9
        );
        // the vehicle drifted off the center column while turning
        assert!(start.x < 100.0);
    }

    #[test]
    fn heading_stays_in_the_normalized_interval() {
        let dr = estimator();
        for dt in [0.0, 0.05, 0.5, 3.0, 30.0] {
            let heading = dr.estimate_start(dt).heading;
            assert!(heading > 0.0 && heading <= TAU, "dt={} -> {}", dt, heading);
        }
    }
}
