//! Planning Orchestrator stack
//!
//! Consumes occupancy-grid updates and sequences one planning cycle per
//! update: rebuild the configuration space, rebuild the Voronoi field,
//! estimate the start pose by dead reckoning, invoke the search engine,
//! then smooth and publish. Each cycle is independent; no state is carried
//! across cycles except the timestamp of the previous grid.

pub mod dead_reckoning;
pub mod engines;

use std::any::Any;
use std::f64::consts::{FRAC_PI_2, PI};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::common::frame::{normalize_heading, GridFrame};
use crate::common::Pose;
use crate::config::HeliosConfig;
use crate::lifecycle::{LifecycleNode, LifecycleNodeBase, State};
use crate::mapping::grid::{GridImage, PATH_COLOR};
use crate::mapping::GridUpdate;

use self::dead_reckoning::DeadReckoning;
use self::engines::{
    AverageSmoother, BrushfireVoronoi, CollisionLookup, GridCollisionLookup, LineSearchEngine,
    PathSmoother, SearchEngine, VoronoiBuilder,
};

/// Start/goal pair handed to the search engine, immutable once built
#[derive(Debug, Clone, Copy)]
pub struct PlanningRequest {
    pub start: Pose,
    pub goal: Pose,
}

/// Stations of one planning cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    GridReady,
    ConfigSpaceBuilt,
    VoronoiBuilt,
    Planned,
    Published,
}

/// Input events consumed by the orchestrator
#[derive(Debug, Clone)]
pub enum PlanningEvent {
    /// A new grid update from the Grid Builder
    Grid(GridUpdate),

    /// Reserved extension point, currently ignored
    VehicleState { speed: f64, steer: f64 },

    /// Reserved extension point, currently ignored
    MissionFlags(i32),
}

/// Everything one cycle produced. `path`, `smoothed` and `monitor` are
/// `None` when the search engine found no solution.
#[derive(Debug, Clone)]
pub struct CycleOutput {
    /// Farthest station the cycle reached
    pub reached: CycleState,

    /// The request that was handed to the search engine
    pub request: PlanningRequest,

    pub path: Option<Vec<Pose>>,
    pub smoothed: Option<Vec<Pose>>,

    /// Copy of the grid with the smoothed path painted on it
    pub monitor: Option<GridImage>,
}

/// Planning Orchestrator component
pub struct PlanningStack {
    base: LifecycleNodeBase,
    frame: GridFrame,
    estimator: DeadReckoning,

    lookup: Box<dyn CollisionLookup>,
    voronoi_builder: Box<dyn VoronoiBuilder>,
    engine: Box<dyn SearchEngine>,
    smoother: Box<dyn PathSmoother>,

    state: CycleState,
    last_grid_at: Option<Instant>,
}

impl PlanningStack {
    /// Orchestrator with the default stand-in engines.
    pub fn new(config: &HeliosConfig) -> Self {
        Self::with_engines(
            config,
            Box::new(GridCollisionLookup::new(config.path.headings)),
            Box::new(BrushfireVoronoi),
            Box::new(LineSearchEngine),
            Box::new(AverageSmoother::default()),
        )
    }

    /// Orchestrator with explicit collaborator engines.
    pub fn with_engines(
        config: &HeliosConfig,
        lookup: Box<dyn CollisionLookup>,
        voronoi_builder: Box<dyn VoronoiBuilder>,
        engine: Box<dyn SearchEngine>,
        smoother: Box<dyn PathSmoother>,
    ) -> Self {
        let frame = GridFrame::new(
            config.map.width,
            config.map.height,
            config.map.resolution,
            config.vehicle.sensor_offset,
        );
        PlanningStack {
            base: LifecycleNodeBase::new("planning_stack"),
            frame,
            estimator: DeadReckoning::new(
                config.motion.velocity,
                config.motion.steer_delta,
                config.vehicle.wheelbase,
                frame,
            ),
            lookup,
            voronoi_builder,
            engine,
            smoother,
            state: CycleState::Idle,
            last_grid_at: None,
        }
    }

    /// Handle one input event; a grid update runs a full planning cycle.
    pub fn handle_event(&mut self, event: PlanningEvent) -> Option<CycleOutput> {
        match event {
            PlanningEvent::Grid(update) => Some(self.run_cycle(&update)),
            PlanningEvent::VehicleState { .. } | PlanningEvent::MissionFlags(_) => None,
        }
    }

    /// Run one cycle against the wall clock: the dead-reckoning horizon is
    /// the time since the previous grid update arrived.
    pub fn run_cycle(&mut self, update: &GridUpdate) -> CycleOutput {
        let now = Instant::now();
        let dt = self
            .last_grid_at
            .map(|t| now.duration_since(t).as_secs_f64())
            .unwrap_or(0.0);
        self.last_grid_at = Some(now);
        self.plan_cycle(update, dt)
    }

    /// The cycle itself, with the elapsed time passed in explicitly.
    pub fn plan_cycle(&mut self, update: &GridUpdate, dt: f64) -> CycleOutput {
        self.advance(CycleState::GridReady);

        // configuration space is rebuilt from scratch every cycle
        self.lookup.rebuild(&update.map);
        self.advance(CycleState::ConfigSpaceBuilt);

        let voronoi_t0 = Instant::now();
        let occupied = update.map.binarize();
        let field = self
            .voronoi_builder
            .build(update.map.width, update.map.height, &occupied);
        debug!(elapsed = ?voronoi_t0.elapsed(), "voronoi field rebuilt");
        self.advance(CycleState::VoronoiBuilt);

        let start = self.estimator.estimate_start(dt);
        let goal = Pose {
            x: (self.frame.width / 2) as f64,
            y: 1.0,
            heading: normalize_heading(FRAC_PI_2 + PI),
        };
        let request = PlanningRequest { start, goal };
        info!(
            dt,
            start_x = start.x,
            start_y = start.y,
            start_heading = start.heading,
            goal_x = goal.x,
            goal_y = goal.y,
            "invoking path search"
        );

        let search_t0 = Instant::now();
        let solution = self
            .engine
            .search(&request, self.lookup.as_ref())
            .filter(|path| !path.is_empty());
        debug!(elapsed = ?search_t0.elapsed(), "path search finished");
        self.advance(CycleState::Planned);

        let output = match solution {
            None => {
                // no solution: skip smoothing and publication, next grid
                // update starts a fresh cycle
                warn!("search returned no solution, nothing published this cycle");
                CycleOutput {
                    reached: CycleState::Planned,
                    request,
                    path: None,
                    smoothed: None,
                    monitor: None,
                }
            }
            Some(path) => {
                let smoothed = self.smoother.smooth(&path, &field);
                let monitor = draw_monitor(&update.map, &smoothed);
                self.advance(CycleState::Published);
                info!(
                    raw_points = path.len(),
                    smoothed_points = smoothed.len(),
                    "published planned and smoothed paths"
                );
                CycleOutput {
                    reached: CycleState::Published,
                    request,
                    path: Some(path),
                    smoothed: Some(smoothed),
                    monitor: Some(monitor),
                }
            }
        };

        self.advance(CycleState::Idle);
        output
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    fn advance(&mut self, to: CycleState) {
        debug!(from = ?self.state, to = ?to, "cycle transition");
        self.state = to;
    }
}

/// Paint the smoothed path onto a copy of the grid image.
fn draw_monitor(map: &GridImage, smoothed: &[Pose]) -> GridImage {
    let mut monitor = map.clone();
    for pose in smoothed {
        monitor.put(pose.x as i32, pose.y as i32, PATH_COLOR);
    }
    monitor
}

impl LifecycleNode for PlanningStack {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TargetPoint;
    use crate::mapping::grid::{OBSTACLE_COLOR, OCCUPIED};
    use std::time::SystemTime;

    struct NoSolutionEngine;

    impl SearchEngine for NoSolutionEngine {
        fn search(
            &self,
            _request: &PlanningRequest,
            _lookup: &dyn CollisionLookup,
        ) -> Option<Vec<Pose>> {
            None
        }
    }

    struct EmptySolutionEngine;

    impl SearchEngine for EmptySolutionEngine {
        fn search(
            &self,
            _request: &PlanningRequest,
            _lookup: &dyn CollisionLookup,
        ) -> Option<Vec<Pose>> {
            Some(Vec::new())
        }
    }

    fn config() -> HeliosConfig {
        let mut config = HeliosConfig::default();
        config.map.resolution = 0.1;
        config
    }

    fn update() -> GridUpdate {
        let map = GridImage::new(200, 200);
        GridUpdate {
            map_raw: map.clone(),
            map,
            flag_obstacle: 0,
            target: TargetPoint {
                x: 1.0,
                y: 100.0,
                z: 0.0,
            },
            stamp: SystemTime::now(),
        }
    }

    #[test]
    fn clear_grid_publishes_both_paths_and_an_overlay() {
        let mut stack = PlanningStack::new(&config());
        // a short horizon puts the start pose inside the grid
        let output = stack.plan_cycle(&update(), 0.05);
        assert_eq!(output.reached, CycleState::Published);
        let path = output.path.expect("raw path");
        let smoothed = output.smoothed.expect("smoothed path");
        assert!(path.len() >= 2);
        assert_eq!(smoothed.len(), path.len());
        let monitor = output.monitor.expect("overlay");
        let goal = path.last().unwrap();
        assert_eq!(
            monitor.pixel(goal.x as i32, goal.y as i32),
            PATH_COLOR
        );
        // the cycle is stateless: back to idle afterwards
        assert_eq!(stack.state(), CycleState::Idle);
    }

    #[test]
    fn request_carries_dead_reckoned_start_and_fixed_goal() {
        let mut stack = PlanningStack::new(&config());
        let output = stack.plan_cycle(&update(), 0.0);
        assert_eq!(output.request.start.x, 100.0);
        assert_eq!(output.request.start.y, 200.0);
        assert_eq!(output.request.goal.x, 100.0);
        assert_eq!(output.request.goal.y, 1.0);
        assert!(output.request.goal.heading > 0.0);
    }

    #[test]
    fn no_solution_skips_smoothing_and_publication() {
        let cfg = config();
        let mut stack = PlanningStack::with_engines(
            &cfg,
            Box::new(GridCollisionLookup::new(cfg.path.headings)),
            Box::new(BrushfireVoronoi),
            Box::new(NoSolutionEngine),
            Box::new(AverageSmoother::default()),
        );
        let output = stack.plan_cycle(&update(), 0.05);
        assert_eq!(output.reached, CycleState::Planned);
        assert!(output.path.is_none());
        assert!(output.smoothed.is_none());
        assert!(output.monitor.is_none());
        assert_eq!(stack.state(), CycleState::Idle);

        // the next cycle is unaffected by the failed one
        let output = stack.plan_cycle(&update(), 0.05);
        assert_eq!(output.reached, CycleState::Planned);
    }

    #[test]
    fn empty_solution_counts_as_no_solution() {
        let cfg = config();
        let mut stack = PlanningStack::with_engines(
            &cfg,
            Box::new(GridCollisionLookup::new(cfg.path.headings)),
            Box::new(BrushfireVoronoi),
            Box::new(EmptySolutionEngine),
            Box::new(AverageSmoother::default()),
        );
        let output = stack.plan_cycle(&update(), 0.05);
        assert_eq!(output.reached, CycleState::Planned);
        assert!(output.path.is_none());
    }

    #[test]
    fn blocked_grid_yields_no_publication_with_the_default_engine() {
        let mut stack = PlanningStack::new(&config());
        let mut map = GridImage::new(200, 200);
        map.fill_rect(0, 100, 199, 102, OBSTACLE_COLOR);
        assert_eq!(map.channel0(100, 101), OCCUPIED);
        let blocked = GridUpdate {
            map_raw: map.clone(),
            map,
            flag_obstacle: 1,
            target: TargetPoint {
                x: 1.0,
                y: 100.0,
                z: 0.0,
            },
            stamp: SystemTime::now(),
        };
        let output = stack.plan_cycle(&blocked, 0.05);
        assert_eq!(output.reached, CycleState::Planned);
        assert!(output.path.is_none());
    }

    #[test]
    fn reserved_events_are_ignored() {
        let mut stack = PlanningStack::new(&config());
        assert!(stack
            .handle_event(PlanningEvent::VehicleState { speed: 0.0, steer: 0.0 })
            .is_none());
        assert!(stack.handle_event(PlanningEvent::MissionFlags(0)).is_none());
    }
}
