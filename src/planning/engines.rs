//! Collaborator seams for the planning cycle
//!
//! The search engine, Voronoi builder, path smoother, and collision lookup
//! are external engines; the orchestrator only depends on the traits below.
//! The default implementations here are deliberately simple stand-ins that
//! keep the pipeline runnable end to end until the real engines are wired
//! in.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use crate::common::frame::normalize_heading;
use crate::common::Pose;
use crate::mapping::grid::GridImage;

use super::PlanningRequest;

/// Distance-to-nearest-obstacle field over the grid, in cells
#[derive(Debug, Clone)]
pub struct VoronoiField {
    pub width: i32,
    pub height: i32,
    dist: Vec<f64>,
}

impl VoronoiField {
    /// Distance at a cell; cells outside the grid report zero clearance.
    pub fn distance(&self, cx: i32, cy: i32) -> f64 {
        if cx < 0 || cx >= self.width || cy < 0 || cy >= self.height {
            return 0.0;
        }
        self.dist[(cy * self.width + cx) as usize]
    }
}

/// Configuration-space / collision-footprint collaborator
pub trait CollisionLookup: Send {
    /// Rebuild the lookup tables for a new grid. Called once per cycle;
    /// total for any well-formed grid.
    fn rebuild(&mut self, grid: &GridImage);

    /// Whether the given pose is traversable in the current grid.
    fn is_traversable(&self, pose: &Pose) -> bool;
}

/// Voronoi-diagram collaborator
pub trait VoronoiBuilder: Send {
    /// Build the field from a row-major binary occupancy view.
    fn build(&mut self, width: i32, height: i32, occupied: &[bool]) -> VoronoiField;
}

/// Path-search collaborator
pub trait SearchEngine: Send {
    /// Search a path from start to goal. `None` means no solution; the
    /// orchestrator skips smoothing and publication for the cycle.
    fn search(&self, request: &PlanningRequest, lookup: &dyn CollisionLookup)
        -> Option<Vec<Pose>>;
}

/// Path-smoothing collaborator, seeded with the Voronoi field
pub trait PathSmoother: Send {
    fn smooth(&self, path: &[Pose], voronoi: &VoronoiField) -> Vec<Pose>;
}

/// Cell-occupancy collision lookup with heading discretization
pub struct GridCollisionLookup {
    headings: usize,
    width: i32,
    height: i32,
    occupied: Vec<bool>,
}

impl GridCollisionLookup {
    pub fn new(headings: usize) -> Self {
        GridCollisionLookup {
            headings,
            width: 0,
            height: 0,
            occupied: Vec::new(),
        }
    }

    /// Bin index for a normalized heading. Headings live in (0, 2pi], so
    /// the result is always in [0, headings).
    pub fn heading_bin(&self, heading: f64) -> usize {
        let step = TAU / self.headings as f64;
        let bin = (heading / step).ceil().max(1.0) as usize - 1;
        bin.min(self.headings - 1)
    }
}

impl CollisionLookup for GridCollisionLookup {
    fn rebuild(&mut self, grid: &GridImage) {
        self.width = grid.width;
        self.height = grid.height;
        self.occupied = grid.binarize();
    }

    fn is_traversable(&self, pose: &Pose) -> bool {
        let cx = pose.x.round() as i32;
        let cy = pose.y.round() as i32;
        if cx < 0 || cx >= self.width || cy < 0 || cy >= self.height {
            return false;
        }
        // per-heading footprints collapse to the cell itself for this
        // point-sized stand-in
        !self.occupied[(cy * self.width + cx) as usize]
    }
}

/// Brushfire distance transform over the binary occupancy view
pub struct BrushfireVoronoi;

impl VoronoiBuilder for BrushfireVoronoi {
    fn build(&mut self, width: i32, height: i32, occupied: &[bool]) -> VoronoiField {
        let len = (width * height) as usize;
        let mut dist = vec![f64::INFINITY; len];
        let mut queue = VecDeque::new();

        for (i, &cell) in occupied.iter().enumerate().take(len) {
            if cell {
                dist[i] = 0.0;
                queue.push_back(i);
            }
        }

        while let Some(i) = queue.pop_front() {
            let cx = (i as i32) % width;
            let cy = (i as i32) / width;
            for (nx, ny) in [(cx - 1, cy), (cx + 1, cy), (cx, cy - 1), (cx, cy + 1)] {
                if nx < 0 || nx >= width || ny < 0 || ny >= height {
                    continue;
                }
                let j = (ny * width + nx) as usize;
                if dist[j] > dist[i] + 1.0 {
                    dist[j] = dist[i] + 1.0;
                    queue.push_back(j);
                }
            }
        }

        VoronoiField {
            width,
            height,
            dist,
        }
    }
}

/// Straight-line search stand-in: samples the segment cell by cell and
/// gives up if any sample is blocked.
pub struct LineSearchEngine;

impl SearchEngine for LineSearchEngine {
    fn search(
        &self,
        request: &PlanningRequest,
        lookup: &dyn CollisionLookup,
    ) -> Option<Vec<Pose>> {
        let dx = request.goal.x - request.start.x;
        let dy = request.goal.y - request.start.y;
        let length = (dx * dx + dy * dy).sqrt();
        let heading = normalize_heading(dy.atan2(dx));
        let steps = length.ceil().max(1.0) as usize;

        let mut path = Vec::with_capacity(steps + 1);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let pose = Pose {
                x: request.start.x + t * dx,
                y: request.start.y + t * dy,
                heading: if i == steps { request.goal.heading } else { heading },
            };
            if !lookup.is_traversable(&pose) {
                return None;
            }
            path.push(pose);
        }
        Some(path)
    }
}

/// Neighbor-averaging smoother stand-in. Interior points relax toward the
/// midpoint of their neighbors; the pull is damped where the Voronoi field
/// reports low clearance so the path is not dragged into obstacles.
pub struct AverageSmoother {
    pub iterations: usize,
    pub alpha: f64,
    pub clearance: f64,
}

impl Default for AverageSmoother {
    fn default() -> Self {
        AverageSmoother {
            iterations: 10,
            alpha: 0.5,
            clearance: 4.0,
        }
    }
}

impl PathSmoother for AverageSmoother {
    fn smooth(&self, path: &[Pose], voronoi: &VoronoiField) -> Vec<Pose> {
        if path.len() < 3 {
            return path.to_vec();
        }
        let mut points = path.to_vec();
        for _ in 0..self.iterations {
            for i in 1..points.len() - 1 {
                let mid_x = (points[i - 1].x + points[i + 1].x) / 2.0;
                let mid_y = (points[i - 1].y + points[i + 1].y) / 2.0;
                let cell = (points[i].x.round() as i32, points[i].y.round() as i32);
                let damp = (voronoi.distance(cell.0, cell.1) / self.clearance).min(1.0);
                points[i].x += self.alpha * damp * (mid_x - points[i].x);
                points[i].y += self.alpha * damp * (mid_y - points[i].y);
            }
        }
        // headings follow the smoothed geometry; endpoints keep their own
        for i in 1..points.len() - 1 {
            let dx = points[i + 1].x - points[i - 1].x;
            let dy = points[i + 1].y - points[i - 1].y;
            points[i].heading = normalize_heading(dy.atan2(dx));
        }
        points
    }
}
