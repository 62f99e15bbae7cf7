use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;
use tracing::{debug, info, warn};

use tilenav_motion::{AgentId, Direction, InputEvent, MoveSignal, MovementEvent};
use tilenav_navigation::{TerrainClass, TileCoord, WorldBounds, WorldPosition};

use crate::blackboard::{Blackboard, raise_fault, snapshot};
use crate::bus::{Command, Topic};

const DIRECTIONS: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

/// Scripted stand-in for a player: pointer targets, key presses and the
/// occasional terrain edit, all drawn from a seeded RNG.
pub struct InputDriver {
    rng: StdRng,
    agents: Vec<AgentId>,
    bounds: WorldBounds,
    tile_size: f32,
}

impl InputDriver {
    pub fn new(seed: u64, agents: Vec<AgentId>, bounds: WorldBounds, tile_size: f32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            agents,
            bounds,
            tile_size,
        }
    }

    /// Next command, or `None` when there are no agents to drive.
    pub fn next_command(&mut self) -> Option<Command> {
        if self.agents.is_empty() {
            return None;
        }
        let agent = self.agents[self.rng.random_range(0..self.agents.len())];
        let roll = self.rng.random_range(0..100);
        let command = match roll {
            0..60 => Command::Input(InputEvent::Target {
                agent,
                position: WorldPosition::new(
                    self.rng.random_range(0.0..self.bounds.width),
                    self.rng.random_range(0.0..self.bounds.height),
                ),
            }),
            60..85 => Command::Input(InputEvent::Step {
                agent,
                direction: DIRECTIONS[self.rng.random_range(0..DIRECTIONS.len())],
            }),
            85..88 => Command::Cancel(agent),
            88..90 => Command::Teleport {
                agent,
                position: WorldPosition::new(
                    self.rng.random_range(0.0..self.bounds.width),
                    self.rng.random_range(0.0..self.bounds.height),
                ),
            },
            _ => {
                let cols = (self.bounds.width / self.tile_size) as i32;
                let rows = (self.bounds.height / self.tile_size) as i32;
                let tile = TileCoord::new(
                    self.rng.random_range(0..cols.max(1)),
                    self.rng.random_range(0..rows.max(1)),
                );
                let class = match self.rng.random_range(0..3) {
                    0 => TerrainClass::Blocked,
                    1 => TerrainClass::Discouraged,
                    _ => TerrainClass::Standard,
                };
                Command::SetTerrain { tile, class }
            }
        };
        Some(command)
    }
}

/// Publishes a driver command every `interval`.
pub async fn input_task(
    mut driver: InputDriver,
    commands: Topic<Command>,
    interval: Duration,
) -> anyhow::Result<()> {
    info!("Input driver started.");
    let mut ticker = time::interval(interval);
    loop {
        ticker.tick().await;
        if let Some(command) = driver.next_command() {
            debug!(?command, "Publishing command");
            commands.publish(command);
        }
    }
}

/// Logs every movement signal published by the simulation.
pub async fn event_reporter(mut events: broadcast::Receiver<Arc<MovementEvent>>) -> anyhow::Result<()> {
    info!("Event reporter started.");
    loop {
        match events.recv().await {
            Ok(event) => match &event.signal {
                MoveSignal::Arrived { position } => {
                    info!(agent = %event.agent, %position, "Agent arrived")
                }
                MoveSignal::Blocked { reason, position } => {
                    warn!(agent = %event.agent, %position, %reason, "Agent blocked")
                }
                MoveSignal::Rejected { error } => {
                    warn!(agent = %event.agent, %error, "Move rejected")
                }
            },
            Err(RecvError::Lagged(n)) => warn!(skipped = n, "Event reporter lagged"),
            Err(RecvError::Closed) => {
                info!("Event topic closed.");
                return Ok(());
            }
        }
    }
}

/// Raises a fault when the simulation thread stops publishing frames.
pub async fn watchdog(bb: Blackboard, stall_after: Duration) -> anyhow::Result<()> {
    info!("Watchdog task started.");
    let mut tick = time::interval((stall_after / 2).max(Duration::from_millis(1)));
    loop {
        tick.tick().await;
        let last_frame_ts = snapshot(&bb).last_frame_ts;
        let age = Instant::now() - last_frame_ts;
        if age > stall_after {
            warn!(?age, "Simulation frame overdue!");
            raise_fault(&bb, "simulation stalled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver(seed: u64) -> InputDriver {
        InputDriver::new(
            seed,
            vec![AgentId(1), AgentId(2)],
            WorldBounds::new(320.0, 256.0),
            32.0,
        )
    }

    #[test]
    fn test_driver_is_deterministic() {
        let mut a = driver(11);
        let mut b = driver(11);
        for _ in 0..50 {
            assert_eq!(a.next_command(), b.next_command());
        }
    }

    #[test]
    fn test_driver_stays_in_bounds() {
        let mut d = driver(3);
        for _ in 0..500 {
            match d.next_command().unwrap() {
                Command::Input(InputEvent::Target { agent, position }) | Command::Teleport { agent, position } => {
                    assert!([AgentId(1), AgentId(2)].contains(&agent));
                    assert!(WorldBounds::new(320.0, 256.0).contains(position));
                }
                Command::SetTerrain { tile, .. } => {
                    assert!((0..10).contains(&tile.col) && (0..8).contains(&tile.row));
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_driver_without_agents_is_silent() {
        let mut d = InputDriver::new(1, Vec::new(), WorldBounds::new(64.0, 64.0), 32.0);
        assert!(d.next_command().is_none());
    }

    #[tokio::test]
    async fn test_event_reporter_exits_when_topic_closes() {
        let topic: Topic<MovementEvent> = Topic::new(4);
        let rx = topic.subscribe();
        topic.publish(MovementEvent {
            agent: AgentId(1),
            signal: MoveSignal::Arrived {
                position: WorldPosition::new(1.0, 1.0),
            },
        });
        drop(topic);
        event_reporter(rx).await.unwrap();
    }
}
