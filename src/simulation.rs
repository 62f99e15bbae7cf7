use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use parking_lot::RwLock;
use spin_sleep::SpinSleeper;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use tilenav_motion::{
    AgentId, InputOutcome, InputTranslator, MoveSignal, MovementCoordinator, MovementEvent,
};
use tilenav_navigation::{GridMap, TileGrid};

use crate::blackboard::{AgentView, Blackboard, publish_frame};
use crate::bus::{Command, Topic};
use crate::settings::AppConfig;

pub type SharedGrid = Arc<RwLock<TileGrid>>;

/// Owns the coordinator and input state; lives on the simulation thread.
pub struct Simulation {
    coordinator: MovementCoordinator<SharedGrid>,
    input: InputTranslator,
    frame: u64,
}

impl Simulation {
    /// Builds the coordinator and registers every configured agent.
    pub fn new(config: &AppConfig, grid: SharedGrid) -> anyhow::Result<Self> {
        let mut coordinator = MovementCoordinator::new(grid, config.movement);
        for spawn in &config.simulation.agents {
            let id = AgentId(spawn.id);
            let position = tilenav_navigation::WorldPosition::new(spawn.x, spawn.y);
            coordinator
                .register_agent(id, position)
                .with_context(|| format!("spawning {} at {}", id, position))?;
            info!(agent = %id, %position, "Agent spawned");
        }
        Ok(Self {
            coordinator,
            input: InputTranslator::new(config.input),
            frame: 0,
        })
    }

    pub fn coordinator(&self) -> &MovementCoordinator<SharedGrid> {
        &self.coordinator
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Applies one command. Terrain edits land here, between ticks.
    pub fn apply(&mut self, command: &Command, now: Instant) {
        match *command {
            Command::Input(event) => match self.input.handle(&mut self.coordinator, event, now) {
                InputOutcome::Rejected(e) => debug!(?event, error = %e, "Input rejected"),
                outcome => debug!(?event, ?outcome, "Input handled"),
            },
            Command::Teleport { agent, position } => {
                if let Err(e) = self.coordinator.teleport(agent, position) {
                    warn!(agent = %agent, %position, error = %e, "Teleport refused");
                }
            }
            Command::Cancel(agent) => {
                if let Err(e) = self.coordinator.cancel_move(agent) {
                    warn!(agent = %agent, error = %e, "Cancel refused");
                }
            }
            Command::SetTerrain { tile, class } => {
                let grid = self.coordinator.grid();
                let occupied = self
                    .coordinator
                    .agents()
                    .any(|a| grid.tile_of(a.position()) == tile);
                if occupied && !class.is_walkable() {
                    debug!(%tile, "Skipping terrain edit under an agent");
                    return;
                }
                match grid.write().set_terrain(tile, class) {
                    Ok(()) => debug!(%tile, ?class, "Terrain changed"),
                    Err(e) => warn!(%tile, error = %e, "Terrain edit refused"),
                }
            }
        }
    }

    /// Advances every agent by `dt` and returns the signals raised.
    pub fn step(&mut self, dt: f32) -> Vec<MovementEvent> {
        self.frame += 1;
        self.coordinator.tick_all(dt);
        self.coordinator.drain_events()
    }

    pub fn views(&self) -> Vec<AgentView> {
        self.coordinator
            .agents()
            .map(|a| AgentView {
                id: a.id(),
                position: a.position(),
                facing: a.facing(),
                moving: a.is_moving(),
                target: a.movement().map(|m| m.target),
            })
            .collect()
    }
}

/// Fixed-rate simulation loop: drain commands, tick, publish.
pub fn run_loop(
    mut sim: Simulation,
    frame_dt: f32,
    bb: Blackboard,
    mut commands: broadcast::Receiver<Arc<Command>>,
    events: Topic<MovementEvent>,
    shutdown: Arc<AtomicBool>,
) -> Simulation {
    info!("Simulation thread started.");
    let sleeper = SpinSleeper::default();
    let period = Duration::from_secs_f32(frame_dt);

    while !shutdown.load(Ordering::Relaxed) {
        let frame_start = Instant::now();
        loop {
            match commands.try_recv() {
                Ok(command) => sim.apply(&command, frame_start),
                Err(TryRecvError::Lagged(n)) => warn!(skipped = n, "Command topic lagged"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        let (mut arrivals, mut blocks, mut rejections) = (0, 0, 0);
        for event in sim.step(frame_dt) {
            match event.signal {
                MoveSignal::Arrived { .. } => arrivals += 1,
                MoveSignal::Blocked { .. } => blocks += 1,
                MoveSignal::Rejected { .. } => rejections += 1,
            }
            events.publish(event);
        }
        publish_frame(&bb, sim.frame(), sim.views(), arrivals, blocks, rejections);

        if let Some(rest) = period.checked_sub(frame_start.elapsed()) {
            sleeper.sleep(rest);
        }
    }

    info!(frames = sim.frame(), "Simulation thread stopped.");
    sim
}
