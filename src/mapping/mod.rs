//! Grid Builder stack
//!
//! Consumes the lane mask and the obstacle-return stream and maintains the
//! dual-layer occupancy grid: a planning layer with elliptical safety
//! footprints and a raw layer with padded rectangles. Each obstacle batch
//! produces one [`GridUpdate`] carrying immutable snapshots of both layers,
//! the in-lane obstacle count, and the selected planning target.

pub mod grid;
pub mod raster;
pub mod target;

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::common::frame::GridFrame;
use crate::common::{ObstacleReturn, TargetPoint};
use crate::config::HeliosConfig;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};

use self::grid::{GridImage, LaneMask, SENSOR_MARKER_COLOR};
use self::raster::{ObstacleRasterizer, RasterSettings};
use self::target::TargetSelector;

/// Input events consumed by the Grid Builder
#[derive(Debug, Clone)]
pub enum MappingEvent {
    /// New lane mask; reseeds both grid layers
    LaneMask(LaneMask),

    /// New obstacle-return batch; triggers a draw/publish cycle
    ObstacleReturns(Vec<ObstacleReturn>),

    /// Reserved extension point, currently ignored
    VehicleState { speed: f64, steer: f64 },

    /// Reserved extension point, currently ignored
    MissionFlags(i32),
}

/// One published grid update: immutable snapshots of both layers plus the
/// obstacle flag and the planning target.
#[derive(Debug, Clone)]
pub struct GridUpdate {
    /// Planning layer, obstacles inflated as elliptical footprints
    pub map: GridImage,

    /// Raw layer, obstacles as padded rectangles
    pub map_raw: GridImage,

    /// Number of returns that landed inside the drivable lane
    pub flag_obstacle: i32,

    /// Selected goal point, axis-swapped for the planner
    pub target: TargetPoint,

    pub stamp: SystemTime,
}

/// Grid Builder component
pub struct MappingStack {
    base: LifecycleNodeBase,
    frame: GridFrame,
    rasterizer: ObstacleRasterizer,
    selector: TargetSelector,

    lane_mask: LaneMask,
    map: GridImage,
    map_raw: GridImage,

    // Written wholesale by the ingestion path, snapshotted by the draw path.
    obstacle_points: Arc<Mutex<Vec<ObstacleReturn>>>,
}

impl MappingStack {
    pub fn new(config: &HeliosConfig) -> Self {
        let frame = GridFrame::new(
            config.map.width,
            config.map.height,
            config.map.resolution,
            config.vehicle.sensor_offset,
        );
        let settings = RasterSettings {
            padding_x: config.obstacle.padding_x,
            padding_y: config.obstacle.padding_y,
            safe_x: config.obstacle.safe_x,
            safe_y: config.obstacle.safe_y,
            min_range: config.obstacle.min_range,
            max_range: config.obstacle.max_range,
            min_theta: config.obstacle.min_theta,
            max_theta: config.obstacle.max_theta,
        };
        let lane_mask = LaneMask::new(config.map.width, config.map.height);
        let map = GridImage::from_mask(&lane_mask);
        let map_raw = GridImage::from_mask(&lane_mask);

        MappingStack {
            base: LifecycleNodeBase::new("mapping_stack"),
            frame,
            rasterizer: ObstacleRasterizer::new(frame, settings),
            selector: TargetSelector::new(config.map.width),
            lane_mask,
            map,
            map_raw,
            obstacle_points: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle one input event; an obstacle batch yields a grid update.
    pub fn handle_event(&mut self, event: MappingEvent) -> Option<GridUpdate> {
        match event {
            MappingEvent::LaneMask(mask) => {
                self.on_lane_mask(mask);
                None
            }
            MappingEvent::ObstacleReturns(points) => Some(self.on_obstacle_returns(points)),
            MappingEvent::VehicleState { .. } | MappingEvent::MissionFlags(_) => None,
        }
    }

    /// Store the new lane mask and reseed both layers from it. A mask whose
    /// dimensions disagree with the configured grid is malformed input: it
    /// is logged and dropped, and the previous mask stays in effect.
    fn on_lane_mask(&mut self, mask: LaneMask) {
        if mask.width != self.frame.width || mask.height != self.frame.height {
            warn!(
                mask_width = mask.width,
                mask_height = mask.height,
                grid_width = self.frame.width,
                grid_height = self.frame.height,
                "lane mask dimensions do not match the grid, dropping"
            );
            return;
        }
        self.map = GridImage::from_mask(&mask);
        self.map_raw = GridImage::from_mask(&mask);
        self.lane_mask = mask;
    }

    /// Replace the obstacle buffer and run one draw/publish cycle.
    fn on_obstacle_returns(&mut self, points: Vec<ObstacleReturn>) -> GridUpdate {
        {
            let mut buffer = self
                .obstacle_points
                .lock()
                .expect("obstacle buffer poisoned");
            *buffer = points;
        }
        self.draw_objects()
    }

    /// Rasterize the current obstacle snapshot, stamp the sensor marker,
    /// select the target, and snapshot both layers into a grid update.
    fn draw_objects(&mut self) -> GridUpdate {
        let snapshot = {
            let buffer = self
                .obstacle_points
                .lock()
                .expect("obstacle buffer poisoned");
            buffer.clone()
        };

        let flag_obstacle = self.rasterizer.draw(
            &snapshot,
            &self.lane_mask,
            &mut self.map,
            &mut self.map_raw,
        );
        self.draw_sensor_position();
        let target = self.selector.select(flag_obstacle, &mut self.map_raw);

        debug!(
            returns = snapshot.len(),
            flag_obstacle, "grid update drawn"
        );

        GridUpdate {
            map: self.map.clone(),
            map_raw: self.map_raw.clone(),
            flag_obstacle,
            target,
            stamp: SystemTime::now(),
        }
    }

    /// Grey marker on the raw layer at the sensor mount cell.
    fn draw_sensor_position(&mut self) {
        let (cx, cy) = self.frame.sensor_cell();
        self.map_raw
            .fill_rect(cx - 1, cy, cx, cy, SENSOR_MARKER_COLOR);
    }

    /// Shared handle to the obstacle buffer, for ingestion paths that
    /// replace the batch without going through the event queue.
    pub fn obstacle_buffer(&self) -> Arc<Mutex<Vec<ObstacleReturn>>> {
        Arc::clone(&self.obstacle_points)
    }

    pub fn frame(&self) -> GridFrame {
        self.frame
    }
}

impl LifecycleNode for MappingStack {
    fn on_configure(&mut self) -> Result<(), String> {
        self.base.set_state(State::Inactive);
        Ok(())
    }

    fn on_activate(&mut self) -> Result<(), String> {
        self.base.set_state(State::Active);
        Ok(())
    }

    fn on_deactivate(&mut self) -> Result<(), String> {
        self.base.set_state(State::Inactive);
        Ok(())
    }

    fn on_cleanup(&mut self) -> Result<(), String> {
        self.base.set_state(State::Finalized);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
