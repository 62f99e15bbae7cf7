mod blackboard;
mod bus;
mod driver;
mod settings;
mod simulation;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use parking_lot::RwLock;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tilenav_motion::{AgentId, MovementEvent};
use tilenav_navigation::{GridMap, TerrainClass, TileGrid};

use blackboard::{Blackboard, snapshot};
use bus::{Command, Topic};
use driver::InputDriver;
use settings::AppConfig;
use simulation::{SharedGrid, Simulation};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("tilenav simulation starting.");
    let config = settings::load_config().context("loading configuration")?;
    let grid = build_grid(&config)?;
    info!("\n{}", grid.read());

    let bb: Blackboard = Arc::default();
    let commands: Topic<Command> = Topic::new(64);
    let events: Topic<MovementEvent> = Topic::new(256);
    let shutdown = Arc::new(AtomicBool::new(false));

    let sim = Simulation::new(&config, Arc::clone(&grid))?;
    let agent_ids: Vec<AgentId> = config.simulation.agents.iter().map(|a| AgentId(a.id)).collect();

    info!("Spawning simulation thread...");
    let sim_thread = std::thread::Builder::new()
        .name("simulation".into())
        .spawn({
            let bb = Arc::clone(&bb);
            let rx = commands.subscribe();
            let events = events.clone();
            let shutdown = Arc::clone(&shutdown);
            let frame_dt = config.simulation.frame_dt();
            move || simulation::run_loop(sim, frame_dt, bb, rx, events, shutdown)
        })
        .context("spawning simulation thread")?;

    let input_driver = InputDriver::new(
        config.simulation.seed,
        agent_ids,
        grid.world_bounds(),
        grid.tile_size(),
    );
    let run_for = config.simulation.run_duration()?;
    let stall_after = Duration::from_millis(config.simulation.watchdog_stall_ms);
    let input_interval = Duration::from_millis(config.simulation.input_interval_ms.max(1));

    let outcome = tokio::select! {
        res = driver::input_task(input_driver, commands.clone(), input_interval) => res,
        res = driver::event_reporter(events.subscribe()) => res,
        res = driver::watchdog(Arc::clone(&bb), stall_after) => res,
        _ = tokio::time::sleep(run_for) => {
            info!(seconds = config.simulation.run_seconds, "Run time elapsed.");
            Ok(())
        }
    };
    if let Err(e) = &outcome {
        error!("Async task failed: {:?}", e);
    }

    shutdown.store(true, Ordering::Relaxed);
    let sim = tokio::task::spawn_blocking(move || sim_thread.join())
        .await?
        .map_err(|_| anyhow::anyhow!("simulation thread panicked"))?;

    report(&bb, &sim);
    outcome
}

/// Parses the configured map, scatters extra obstacles and clears spawn tiles.
fn build_grid(config: &AppConfig) -> anyhow::Result<SharedGrid> {
    let sim = &config.simulation;
    let mut grid = TileGrid::from_ascii(&sim.map, sim.tile_size).context("parsing simulation map")?;

    let mut rng = StdRng::seed_from_u64(sim.seed);
    grid.scatter_obstacles(&mut rng, sim.random_obstacles, 2);
    for spawn in &sim.agents {
        let position = tilenav_navigation::WorldPosition::new(spawn.x, spawn.y);
        if let Some(tile) = grid.tile_at(position) {
            if grid.terrain_class(tile) == TerrainClass::Blocked {
                grid.set_terrain(tile, TerrainClass::Standard)?;
            }
        }
    }
    Ok(Arc::new(RwLock::new(grid)))
}

fn report(bb: &Blackboard, sim: &Simulation) {
    let state = snapshot(bb);
    info!(
        frames = state.frame,
        arrivals = state.arrivals,
        blocks = state.blocks,
        rejections = state.rejections,
        "Simulation finished."
    );
    for agent in &state.agents {
        info!(
            agent = %agent.id,
            position = %agent.position,
            facing = ?agent.facing,
            moving = agent.moving,
            target = ?agent.target,
            "Final agent state"
        );
    }
    for fault in &state.faults {
        warn!(fault = %fault, "Fault raised during run");
    }

    let grid = sim.coordinator().grid().read();
    let mut rendered = String::new();
    for row in 0..grid.grid_height() {
        for col in 0..grid.grid_width() {
            let tile = tilenav_navigation::TileCoord::new(col, row);
            let occupant = state
                .agents
                .iter()
                .find(|a| grid.tile_of(a.position) == tile);
            match occupant {
                Some(a) => rendered.push(char::from_digit((a.id.0 % 10) as u32, 10).unwrap_or('@')),
                None => rendered.push(grid.terrain_class(tile).symbol()),
            }
        }
        rendered.push('\n');
    }
    info!("Final map:\n{}", rendered);
}
