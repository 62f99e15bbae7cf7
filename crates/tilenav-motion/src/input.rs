//! Turns raw player input into coordinator requests.
//!
//! Discrete input (a direction key) is debounced per agent and becomes either
//! a short direct step or a pathfinding request. Continuous input (a pointer
//! position) is forwarded as a move request unchanged.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tilenav_navigation::{GridMap, WorldPosition};

use crate::agent::{AgentId, Direction};
use crate::coordinator::MovementCoordinator;
use crate::error::MoveError;

/// Tunables for [`InputTranslator`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InputConfig {
    /// Minimum time between two accepted discrete inputs for one agent, in milliseconds.
    pub debounce_ms: u64,
    /// Distance a discrete input moves the agent, in world units.
    pub step_distance: f32,
    /// Steps shorter than this skip pathfinding and are applied directly.
    pub direct_step_threshold: f32,
}

impl InputConfig {
    /// The debounce interval.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 120,
            step_distance: 8.0,
            direct_step_threshold: 16.0,
        }
    }
}

/// A single piece of player input.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InputEvent {
    /// A discrete directional input.
    Step {
        /// The agent being controlled.
        agent: AgentId,
        /// Direction pressed.
        direction: Direction,
    },
    /// A continuous input resolved to a world position.
    Target {
        /// The agent being controlled.
        agent: AgentId,
        /// Where to go.
        position: WorldPosition,
    },
}

/// What [`InputTranslator::handle`] did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputOutcome {
    /// Dropped: arrived within the debounce interval.
    Debounced,
    /// Applied as a direct step.
    Stepped,
    /// Forwarded as a move request that was accepted.
    Requested,
    /// The coordinator refused it.
    Rejected(MoveError),
}

/// Per-agent input state.
#[derive(Debug, Default)]
pub struct InputTranslator {
    config: InputConfig,
    last_input: HashMap<AgentId, Instant>,
}

impl InputTranslator {
    /// Creates a translator with the given configuration.
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            last_input: HashMap::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    /// Translates `event` into coordinator calls.
    ///
    /// `now` is supplied by the caller so that debouncing is deterministic.
    pub fn handle<G: GridMap>(
        &mut self,
        coordinator: &mut MovementCoordinator<G>,
        event: InputEvent,
        now: Instant,
    ) -> InputOutcome {
        match event {
            InputEvent::Step { agent, direction } => self.step(coordinator, agent, direction, now),
            InputEvent::Target { agent, position } => match coordinator.request_move(agent, position) {
                Ok(()) => InputOutcome::Requested,
                Err(e) => InputOutcome::Rejected(e),
            },
        }
    }

    fn step<G: GridMap>(
        &mut self,
        coordinator: &mut MovementCoordinator<G>,
        agent: AgentId,
        direction: Direction,
        now: Instant,
    ) -> InputOutcome {
        if let Some(&last) = self.last_input.get(&agent) {
            if now.saturating_duration_since(last) < self.config.debounce() {
                trace!(agent = %agent, "Input debounced");
                return InputOutcome::Debounced;
            }
        }
        let Some(position) = coordinator.position(agent) else {
            return InputOutcome::Rejected(MoveError::AgentNotFound(agent));
        };
        self.last_input.insert(agent, now);

        let displacement = direction.offset(self.config.step_distance);
        let result = if self.config.step_distance < self.config.direct_step_threshold {
            // A refused step leaves any in-flight movement alone.
            coordinator
                .apply_step(agent, displacement)
                .and_then(|()| coordinator.cancel_move(agent))
                .map(|()| InputOutcome::Stepped)
        } else {
            coordinator
                .request_move(agent, position + displacement)
                .map(|()| InputOutcome::Requested)
        };
        result.unwrap_or_else(InputOutcome::Rejected)
    }

    /// Drops the stored timestamp for `agent`, e.g. when it is destroyed.
    pub fn forget(&mut self, agent: AgentId) {
        self.last_input.remove(&agent);
    }

    /// Number of agents with a stored timestamp.
    pub fn tracked_agents(&self) -> usize {
        self.last_input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::{MoveSignal, MovementConfig};
    use crate::error::BlockReason;
    use tilenav_navigation::TileGrid;

    fn setup() -> (MovementCoordinator<TileGrid>, AgentId) {
        let grid = TileGrid::from_ascii(&["....", "....", "...."], 32.0).unwrap();
        let mut coord = MovementCoordinator::new(grid, MovementConfig::default());
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(48.0, 48.0)).unwrap();
        (coord, id)
    }

    fn step(agent: AgentId, direction: Direction) -> InputEvent {
        InputEvent::Step { agent, direction }
    }

    #[test]
    fn test_direct_step_and_debounce() {
        let (mut coord, id) = setup();
        let mut input = InputTranslator::default();
        let t0 = Instant::now();

        assert_eq!(input.handle(&mut coord, step(id, Direction::Left), t0), InputOutcome::Stepped);
        assert_eq!(coord.position(id), Some(WorldPosition::new(40.0, 48.0)));
        assert_eq!(coord.facing(id), Some(Direction::Left));

        // Within 120 ms: dropped.
        let t1 = t0 + Duration::from_millis(50);
        assert_eq!(input.handle(&mut coord, step(id, Direction::Left), t1), InputOutcome::Debounced);
        assert_eq!(coord.position(id), Some(WorldPosition::new(40.0, 48.0)));

        let t2 = t0 + Duration::from_millis(120);
        assert_eq!(input.handle(&mut coord, step(id, Direction::Up), t2), InputOutcome::Stepped);
        assert_eq!(coord.position(id), Some(WorldPosition::new(40.0, 40.0)));
        assert_eq!(coord.facing(id), Some(Direction::Up));
    }

    #[test]
    fn test_debounce_is_per_agent() {
        let (mut coord, a) = setup();
        let b = AgentId(2);
        coord.register_agent(b, WorldPosition::new(16.0, 16.0)).unwrap();
        let mut input = InputTranslator::default();
        let t0 = Instant::now();

        assert_eq!(input.handle(&mut coord, step(a, Direction::Right), t0), InputOutcome::Stepped);
        assert_eq!(input.handle(&mut coord, step(b, Direction::Down), t0), InputOutcome::Stepped);
        assert_eq!(input.tracked_agents(), 2);

        input.forget(a);
        assert_eq!(input.tracked_agents(), 1);
        assert_eq!(input.handle(&mut coord, step(a, Direction::Right), t0), InputOutcome::Stepped);
        assert_eq!(input.handle(&mut coord, step(b, Direction::Down), t0), InputOutcome::Debounced);
    }

    #[test]
    fn test_direct_step_cancels_movement() {
        let (mut coord, id) = setup();
        let mut input = InputTranslator::default();
        coord.request_move(id, WorldPosition::new(112.0, 80.0)).unwrap();
        assert!(coord.is_moving(id));

        assert_eq!(
            input.handle(&mut coord, step(id, Direction::Down), Instant::now()),
            InputOutcome::Stepped
        );
        assert!(!coord.is_moving(id));
        assert_eq!(coord.position(id), Some(WorldPosition::new(48.0, 56.0)));
    }

    #[test]
    fn test_blocked_direct_step() {
        let grid = TileGrid::from_ascii(&["#.."], 32.0).unwrap();
        let mut coord = MovementCoordinator::new(grid, MovementConfig::default());
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(36.0, 16.0)).unwrap();
        let mut input = InputTranslator::default();

        assert_eq!(
            input.handle(&mut coord, step(id, Direction::Left), Instant::now()),
            InputOutcome::Rejected(MoveError::Blocked(BlockReason::Unwalkable))
        );
        assert_eq!(coord.position(id), Some(WorldPosition::new(36.0, 16.0)));
    }

    #[test]
    fn test_blocked_direct_step_keeps_movement() {
        let grid = TileGrid::from_ascii(&["#....", ".....", "....."], 32.0).unwrap();
        let mut coord = MovementCoordinator::new(grid, MovementConfig::default());
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(36.0, 16.0)).unwrap();
        let target = WorldPosition::new(144.0, 80.0);
        coord.request_move(id, target).unwrap();
        let before = coord.movement_state(id);
        let mut input = InputTranslator::default();

        assert_eq!(
            input.handle(&mut coord, step(id, Direction::Left), Instant::now()),
            InputOutcome::Rejected(MoveError::Blocked(BlockReason::Unwalkable))
        );
        assert!(coord.is_moving(id));
        assert_eq!(coord.movement_state(id), before);
        assert_eq!(coord.position(id), Some(WorldPosition::new(36.0, 16.0)));

        let events = coord.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].signal,
            MoveSignal::Rejected {
                error: MoveError::Blocked(BlockReason::Unwalkable)
            }
        ));
    }

    #[test]
    fn test_long_step_uses_pathfinding() {
        let (mut coord, id) = setup();
        let mut input = InputTranslator::new(InputConfig {
            step_distance: 32.0,
            ..InputConfig::default()
        });

        assert_eq!(
            input.handle(&mut coord, step(id, Direction::Right), Instant::now()),
            InputOutcome::Requested
        );
        let state = coord.movement_state(id).unwrap();
        assert_eq!(state.target, WorldPosition::new(80.0, 48.0));
        assert_eq!(coord.position(id), Some(WorldPosition::new(48.0, 48.0)));
    }

    #[test]
    fn test_target_event_forwards_request() {
        let (mut coord, id) = setup();
        let mut input = InputTranslator::default();
        let now = Instant::now();

        let target = WorldPosition::new(112.0, 80.0);
        assert_eq!(
            input.handle(&mut coord, InputEvent::Target { agent: id, position: target }, now),
            InputOutcome::Requested
        );
        // Continuous input is not debounced.
        assert_eq!(
            input.handle(&mut coord, InputEvent::Target { agent: id, position: target }, now),
            InputOutcome::Requested
        );
        assert_eq!(input.tracked_agents(), 0);

        let outside = WorldPosition::new(500.0, 0.0);
        assert_eq!(
            input.handle(&mut coord, InputEvent::Target { agent: id, position: outside }, now),
            InputOutcome::Rejected(MoveError::InvalidTarget(outside))
        );
    }

    #[test]
    fn test_unknown_agent_rejected() {
        let (mut coord, _) = setup();
        let mut input = InputTranslator::default();
        let ghost = AgentId(42);
        assert_eq!(
            input.handle(&mut coord, step(ghost, Direction::Up), Instant::now()),
            InputOutcome::Rejected(MoveError::AgentNotFound(ghost))
        );
        assert_eq!(input.tracked_agents(), 0);
    }
}
