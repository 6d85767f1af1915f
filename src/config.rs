//! Configuration loading for the Helios core
//!
//! The whole process reads one YAML file at startup. The resulting struct is
//! immutable for the lifetime of the process; there is no hot reload.

use crate::error::{HeliosError, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct HeliosConfig {
    pub map: MapConfig,
    pub obstacle: ObstacleConfig,
    pub vehicle: VehicleConfig,
    pub road: RoadConfig,
    pub path: PathConfig,
    #[serde(default)]
    pub motion: MotionConfig,
}

/// Grid geometry
#[derive(Clone, Debug, Deserialize)]
pub struct MapConfig {
    /// Grid width in cells
    pub width: i32,

    /// Grid height in cells
    pub height: i32,

    /// Metric size of one cell (m/cell)
    pub resolution: f64,
}

/// Obstacle rasterization parameters
#[derive(Clone, Debug, Deserialize)]
pub struct ObstacleConfig {
    /// Half-width of the raw-layer rectangle (cells)
    pub padding_x: i32,

    /// Half-height of the raw-layer rectangle (cells)
    pub padding_y: i32,

    /// Horizontal half-axis of the planning-layer ellipse (cells)
    pub safe_x: i32,

    /// Vertical half-axis of the planning-layer ellipse (cells)
    pub safe_y: i32,

    /// Returns closer than this are discarded (m)
    pub min_range: f64,

    /// Returns farther than this are discarded (m)
    pub max_range: f64,

    /// Bearing gate, lower bound (degrees)
    pub min_theta: f64,

    /// Bearing gate, upper bound (degrees)
    pub max_theta: f64,
}

/// Vehicle physical parameters
#[derive(Clone, Debug, Deserialize)]
pub struct VehicleConfig {
    /// Distance between front and rear axle (m)
    pub wheelbase: f64,

    /// Vehicle width (m)
    pub width: f64,

    /// Vehicle length (m)
    pub length: f64,

    /// Distance from the vehicle reference point to the range sensor mount (m)
    pub sensor_offset: f64,
}

/// Road parameters
#[derive(Clone, Debug, Deserialize)]
pub struct RoadConfig {
    /// Nominal lane width (m)
    pub lane_width: f64,
}

/// Search-engine discretization
#[derive(Clone, Debug, Deserialize)]
pub struct PathConfig {
    /// Number of heading bins used by the search engine
    pub headings: usize,
}

/// Nominal motion assumptions for dead reckoning
#[derive(Clone, Debug, Deserialize)]
pub struct MotionConfig {
    /// Nominal forward speed (m/s)
    #[serde(default = "default_velocity")]
    pub velocity: f64,

    /// Nominal steering delta (rad)
    #[serde(default = "default_steer_delta")]
    pub steer_delta: f64,
}

fn default_velocity() -> f64 {
    10.0
}

fn default_steer_delta() -> f64 {
    std::f64::consts::PI / 10.0
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            velocity: default_velocity(),
            steer_delta: default_steer_delta(),
        }
    }
}

impl HeliosConfig {
    /// Load configuration from a YAML file. Any failure here is fatal: the
    /// process must not start serving with a partial configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| HeliosError::Config(format!("failed to read config file: {}", e)))?;
        let config: HeliosConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.map.width <= 2 || self.map.height <= 2 {
            return Err(HeliosError::Config(
                "map width and height must be larger than 2 cells".to_string(),
            ));
        }
        if self.map.resolution <= 0.0 {
            return Err(HeliosError::Config(
                "map resolution must be positive".to_string(),
            ));
        }
        if self.obstacle.min_range >= self.obstacle.max_range {
            return Err(HeliosError::Config(
                "obstacle range gate is empty (min_range >= max_range)".to_string(),
            ));
        }
        if self.obstacle.min_theta >= self.obstacle.max_theta {
            return Err(HeliosError::Config(
                "obstacle bearing gate is empty (min_theta >= max_theta)".to_string(),
            ));
        }
        if self.vehicle.wheelbase <= 0.0 {
            return Err(HeliosError::Config(
                "vehicle wheelbase must be positive".to_string(),
            ));
        }
        if self.path.headings == 0 {
            return Err(HeliosError::Config(
                "heading bin count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for HeliosConfig {
    fn default() -> Self {
        Self {
            map: MapConfig {
                width: 200,
                height: 200,
                resolution: 0.05,
            },
            obstacle: ObstacleConfig {
                padding_x: 10,
                padding_y: 10,
                safe_x: 12,
                safe_y: 12,
                min_range: 0.5,
                max_range: 10.0,
                min_theta: -90.0,
                max_theta: 90.0,
            },
            vehicle: VehicleConfig {
                wheelbase: 1.6,
                width: 1.2,
                length: 2.0,
                sensor_offset: 1.0,
            },
            road: RoadConfig { lane_width: 3.5 },
            path: PathConfig { headings: 12 },
            motion: MotionConfig::default(),
        }
    }
}
