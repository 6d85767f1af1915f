//! Helios navigation node
//!
//! Hosts the Grid Builder and the Planning Orchestrator on dedicated
//! threads, each a single-threaded run-to-completion event loop, connected
//! by typed channels. The sensor transport is out of scope here; a small
//! synthetic feeder stands in for the lane-mask and obstacle streams so the
//! node can run end to end. Ctrl-C performs process-wide teardown: the
//! input channels close and both loops drain and exit.

use anyhow::{Context, Result};
use helios_core::common::ObstacleReturn;
use helios_core::config::HeliosConfig;
use helios_core::lifecycle::LifecycleNode;
use helios_core::mapping::grid::{LaneMask, OCCUPIED};
use helios_core::mapping::{MappingEvent, MappingStack};
use helios_core::planning::{PlanningEvent, PlanningStack};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

fn spawn_mapping_thread(
    config: HeliosConfig,
    map_rx: mpsc::Receiver<MappingEvent>,
    plan_tx: mpsc::Sender<PlanningEvent>,
) -> Result<thread::JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("mapping".into())
        .spawn(move || {
            let mut stack = MappingStack::new(&config);
            if let Err(e) = stack.on_configure().and_then(|_| stack.on_activate()) {
                error!("failed to bring up the mapping stack: {}", e);
                return;
            }
            while let Ok(event) = map_rx.recv() {
                if let Some(update) = stack.handle_event(event) {
                    info!(
                        flag_obstacle = update.flag_obstacle,
                        target_x = update.target.x,
                        target_y = update.target.y,
                        "occupancy grid published"
                    );
                    if plan_tx.send(PlanningEvent::Grid(update)).is_err() {
                        break;
                    }
                }
            }
            let _ = stack.on_deactivate();
            let _ = stack.on_cleanup();
            info!("mapping loop terminated");
        })
        .context("failed to spawn mapping thread")?;
    Ok(handle)
}

fn spawn_planning_thread(
    config: HeliosConfig,
    plan_rx: mpsc::Receiver<PlanningEvent>,
) -> Result<thread::JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("planning".into())
        .spawn(move || {
            let mut stack = PlanningStack::new(&config);
            if let Err(e) = stack.on_configure().and_then(|_| stack.on_activate()) {
                error!("failed to bring up the planning stack: {}", e);
                return;
            }
            while let Ok(event) = plan_rx.recv() {
                if let Some(output) = stack.handle_event(event) {
                    match (&output.path, &output.smoothed) {
                        (Some(path), Some(smoothed)) => info!(
                            raw_points = path.len(),
                            smoothed_points = smoothed.len(),
                            "path and monitor overlay published"
                        ),
                        _ => info!("cycle finished without a path"),
                    }
                }
            }
            let _ = stack.on_deactivate();
            let _ = stack.on_cleanup();
            info!("planning loop terminated");
        })
        .context("failed to spawn planning thread")?;
    Ok(handle)
}

/// Stand-in for the sensor transport: a straight two-boundary lane and one
/// slowly sweeping obstacle return, at 10 Hz.
fn spawn_feeder_thread(
    config: HeliosConfig,
    map_tx: mpsc::Sender<MappingEvent>,
    running: Arc<AtomicBool>,
) -> Result<thread::JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("feeder".into())
        .spawn(move || {
            let width = config.map.width;
            let height = config.map.height;
            let half_lane = (config.road.lane_width / 2.0 / config.map.resolution) as i32;
            let mut mask = LaneMask::new(width, height);
            for cy in 0..height {
                for cx in [width / 2 - half_lane, width / 2 + half_lane] {
                    if cx > 0 && cx < width {
                        mask.set(cx, cy, OCCUPIED);
                    }
                }
            }

            let mut tick: u32 = 0;
            while running.load(Ordering::Relaxed) {
                let bearing = 1.2 + 0.3 * (tick as f64 / 20.0).sin();
                let batch = vec![ObstacleReturn {
                    range: 5.0,
                    bearing,
                }];
                if map_tx.send(MappingEvent::LaneMask(mask.clone())).is_err() {
                    break;
                }
                if map_tx
                    .send(MappingEvent::ObstacleReturns(batch))
                    .is_err()
                {
                    break;
                }
                tick = tick.wrapping_add(1);
                thread::sleep(Duration::from_millis(100));
            }
            info!("feeder loop terminated");
        })
        .context("failed to spawn feeder thread")?;
    Ok(handle)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("helios_core=info".parse()?)
                .add_directive("helios_navigation_node=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("config/system_config.yaml");
    info!("loading configuration from {}", config_path);
    let config = HeliosConfig::load(Path::new(config_path))?;

    let (map_tx, map_rx) = mpsc::channel::<MappingEvent>();
    let (plan_tx, plan_rx) = mpsc::channel::<PlanningEvent>();
    let running = Arc::new(AtomicBool::new(true));

    let mapping = spawn_mapping_thread(config.clone(), map_rx, plan_tx)?;
    let planning = spawn_planning_thread(config.clone(), plan_rx)?;
    let feeder = spawn_feeder_thread(config, map_tx, Arc::clone(&running))?;

    info!("helios navigation node running, Ctrl-C to terminate");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for the termination signal")?;

    // teardown: stop the input side, let the loops drain and exit
    info!("terminate received, shutting down");
    running.store(false, Ordering::Relaxed);
    let _ = feeder.join();
    let _ = mapping.join();
    let _ = planning.join();
    info!("helios navigation node terminated");
    Ok(())
}
