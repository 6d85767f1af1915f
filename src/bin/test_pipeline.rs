//! Offline, single-cycle exercise of the grid-fusion and planning pipeline.

use anyhow::Result;
use helios_core::common::ObstacleReturn;
use helios_core::config::HeliosConfig;
use helios_core::mapping::grid::LaneMask;
use helios_core::mapping::{MappingEvent, MappingStack};
use helios_core::planning::{PlanningEvent, PlanningStack};
use helios_core::HeliosCore;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("helios_core=debug".parse()?)
                .add_directive("test_pipeline=info".parse()?),
        )
        .init();

    info!("initializing Helios core");
    let config = HeliosConfig::default();

    let mut core = HeliosCore::new();
    core.register(MappingStack::new(&config));
    core.register(PlanningStack::new(&config));
    core.init().map_err(anyhow::Error::msg)?;

    // two cycles, as a live node would see them: the first one plans over a
    // zero dead-reckoning horizon, the second over a realistic one
    for cycle in 0..2 {
        let mapping = core.mapping_stack_mut().expect("mapping stack registered");
        mapping.handle_event(MappingEvent::LaneMask(LaneMask::new(
            config.map.width,
            config.map.height,
        )));
        let update = mapping
            .handle_event(MappingEvent::ObstacleReturns(vec![
                ObstacleReturn {
                    range: 4.0,
                    bearing: 1.2,
                },
                ObstacleReturn {
                    range: 6.5,
                    bearing: 1.0,
                },
            ]))
            .expect("obstacle batch yields a grid update");
        info!(
            cycle,
            flag_obstacle = update.flag_obstacle,
            target_x = update.target.x,
            target_y = update.target.y,
            "grid update produced"
        );

        let planning = core.planning_stack_mut().expect("planning stack registered");
        let output = planning.handle_event(PlanningEvent::Grid(update)).unwrap();
        info!(cycle, reached = ?output.reached, "planning cycle finished");
        if let (Some(path), Some(smoothed)) = (&output.path, &output.smoothed) {
            info!(
                cycle,
                raw_points = path.len(),
                smoothed_points = smoothed.len(),
                "paths produced"
            );
        }
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    core.shutdown().map_err(anyhow::Error::msg)?;
    info!("core shut down");
    Ok(())
}
