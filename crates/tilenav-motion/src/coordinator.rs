//! The movement coordinator: owns every agent and drives them along smoothed
//! paths, one deterministic tick at a time.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tilenav_navigation::{GridMap, PathFinder, PathfinderConfig, WorldPosition, smooth_path};

use crate::agent::{Agent, AgentId, Direction, MovementSnapshot, MovementState};
use crate::error::{BlockReason, MoveError};

/// Signals kept before the oldest ones are dropped.
pub const MAX_PENDING_EVENTS: usize = 1024;

/// Tunables for [`MovementCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MovementConfig {
    /// Travel speed in world units per second.
    pub speed: f32,
    /// A waypoint counts as reached within this distance.
    pub arrival_tolerance: f32,
    /// Minimum distance kept between agents during coordinator-driven motion.
    pub separation_radius: f32,
    /// Configuration handed to the path finder.
    pub pathfinder: PathfinderConfig,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 128.0,
            arrival_tolerance: 2.0,
            separation_radius: 16.0,
            pathfinder: PathfinderConfig::default(),
        }
    }
}

/// What a single tick did to an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The agent was not moving.
    Idle,
    /// The agent is still underway.
    Moving,
    /// The agent passed its final waypoint and is now idle.
    Arrived,
    /// The next step was refused and the agent is now idle.
    Blocked(BlockReason),
}

/// Result signal for one agent's movement.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveSignal {
    /// The final waypoint was reached.
    Arrived {
        /// Where the agent stopped.
        position: WorldPosition,
    },
    /// Movement stopped because the next step was refused.
    Blocked {
        /// Why the step was refused.
        reason: BlockReason,
        /// Where the agent stopped.
        position: WorldPosition,
    },
    /// A move request was refused; the previous state is untouched.
    Rejected {
        /// Why the request was refused.
        error: MoveError,
    },
}

/// A [`MoveSignal`] tagged with the agent it concerns.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementEvent {
    /// The agent the signal concerns.
    pub agent: AgentId,
    /// What happened.
    pub signal: MoveSignal,
}

/// Owns all agents on one grid and centralizes their state transitions.
///
/// Agents are kept in registration order and [`MovementCoordinator::tick_all`]
/// updates them in that order, so a run is fully determined by its inputs.
/// The grid is only read during ticks; callers that edit terrain do so between
/// ticks through [`MovementCoordinator::grid_mut`] or a shared lock.
///
/// Signals queue up until [`MovementCoordinator::drain_events`] is called.
/// Callers that only look at return values may never drain; the queue then
/// holds the newest [`MAX_PENDING_EVENTS`] signals.
#[derive(Debug)]
pub struct MovementCoordinator<G> {
    grid: G,
    config: MovementConfig,
    pathfinder: PathFinder,
    agents: Vec<Agent>,
    index: HashMap<AgentId, usize>,
    events: VecDeque<MovementEvent>,
}

impl<G: GridMap> MovementCoordinator<G> {
    /// Creates a coordinator over `grid`.
    pub fn new(grid: G, config: MovementConfig) -> Self {
        Self {
            grid,
            pathfinder: PathFinder::new(config.pathfinder),
            config,
            agents: Vec::new(),
            index: HashMap::new(),
            events: VecDeque::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// The grid agents move on.
    pub fn grid(&self) -> &G {
        &self.grid
    }

    /// Mutable access to the grid, for terrain edits between ticks.
    ///
    /// Paths already being followed are not re-validated; a step onto a tile
    /// that became blocked is refused on the next tick.
    pub fn grid_mut(&mut self) -> &mut G {
        &mut self.grid
    }

    /// Adds an idle agent at `position`.
    ///
    /// # Errors
    /// * [`MoveError::DuplicateAgent`] if `id` is taken.
    /// * [`MoveError::Blocked`] if `position` is out of bounds or not walkable.
    pub fn register_agent(&mut self, id: AgentId, position: WorldPosition) -> Result<(), MoveError> {
        if self.index.contains_key(&id) {
            return Err(MoveError::DuplicateAgent(id));
        }
        self.check_terrain(position).map_err(MoveError::Blocked)?;

        self.index.insert(id, self.agents.len());
        self.agents.push(Agent::new(id, position));
        debug!(agent = %id, %position, "Registered agent");
        Ok(())
    }

    /// Removes an agent and its movement state.
    pub fn remove_agent(&mut self, id: AgentId) -> Result<Agent, MoveError> {
        let slot = self.slot(id)?;
        let agent = self.agents.remove(slot);
        self.index.remove(&id);
        for (i, a) in self.agents.iter().enumerate().skip(slot) {
            self.index.insert(a.id, i);
        }
        debug!(agent = %id, "Removed agent");
        Ok(agent)
    }

    /// Plans a path to `target` and starts following it.
    ///
    /// On success any previous movement is replaced wholesale. On failure the
    /// previous state is kept and a [`MoveSignal::Rejected`] event is recorded.
    pub fn request_move(&mut self, id: AgentId, target: WorldPosition) -> Result<(), MoveError> {
        let slot = self.slot(id)?;
        match self.plan(self.agents[slot].position, target) {
            Ok(state) => {
                debug!(
                    agent = %id,
                    %target,
                    waypoints = state.path.len(),
                    "Move accepted"
                );
                self.agents[slot].movement = Some(state);
                Ok(())
            }
            Err(error) => {
                debug!(agent = %id, %target, %error, "Move rejected");
                self.record(
                    id,
                    MoveSignal::Rejected {
                        error: error.clone(),
                    },
                );
                Err(error)
            }
        }
    }

    fn plan(&self, from: WorldPosition, target: WorldPosition) -> Result<MovementState, MoveError> {
        if !self.grid.world_bounds().contains(target) {
            return Err(MoveError::InvalidTarget(target));
        }
        let result = self.pathfinder.find_path_detailed(&self.grid, from, target)?;
        let path = smooth_path(&self.grid, &result.path);
        Ok(MovementState::new(target, path))
    }

    /// Advances one agent by `dt` seconds.
    pub fn tick(&mut self, id: AgentId, dt: f32) -> Result<TickOutcome, MoveError> {
        let slot = self.slot(id)?;
        Ok(self.tick_slot(slot, dt))
    }

    /// Advances every agent by `dt` seconds in registration order.
    ///
    /// # Returns
    /// The number of agents still moving afterwards.
    pub fn tick_all(&mut self, dt: f32) -> usize {
        (0..self.agents.len())
            .filter(|&slot| self.tick_slot(slot, dt) == TickOutcome::Moving)
            .count()
    }

    fn tick_slot(&mut self, slot: usize, dt: f32) -> TickOutcome {
        let tolerance = self.config.arrival_tolerance;
        let agent = &mut self.agents[slot];
        let (id, position) = (agent.id, agent.position);
        let Some(state) = agent.movement.as_mut() else {
            return TickOutcome::Idle;
        };

        while state
            .current_waypoint()
            .is_some_and(|wp| position.distance(wp) <= tolerance)
        {
            state.cursor += 1;
        }

        let Some(waypoint) = state.current_waypoint() else {
            agent.movement = None;
            debug!(agent = %id, %position, "Arrived");
            self.record(id, MoveSignal::Arrived { position });
            return TickOutcome::Arrived;
        };

        let to_waypoint = waypoint - position;
        let remaining = to_waypoint.length();
        let step = (self.config.speed * dt).min(remaining);
        if !step.is_finite() || step <= 0.0 {
            return TickOutcome::Moving;
        }

        let delta = to_waypoint * (step / remaining);
        let candidate = position + delta;
        match self.check_position(id, candidate) {
            Ok(()) => {
                let agent = &mut self.agents[slot];
                agent.position = candidate;
                if let Some(facing) = Direction::from_delta(delta) {
                    agent.facing = facing;
                }
                trace!(agent = %id, position = %candidate, "Stepped");
                TickOutcome::Moving
            }
            Err(reason) => {
                self.agents[slot].movement = None;
                debug!(agent = %id, %position, %reason, "Blocked");
                self.record(id, MoveSignal::Blocked { reason, position });
                TickOutcome::Blocked(reason)
            }
        }
    }

    /// Places an agent at `position` without pathfinding and clears its
    /// movement.
    ///
    /// Only bounds and walkability are checked, so the agent may land inside
    /// another agent's separation radius. From there it can still step away:
    /// a candidate inside the radius is refused only if it does not increase
    /// the distance to that agent.
    pub fn teleport(&mut self, id: AgentId, position: WorldPosition) -> Result<(), MoveError> {
        let slot = self.slot(id)?;
        self.check_terrain(position).map_err(MoveError::Blocked)?;
        let agent = &mut self.agents[slot];
        agent.position = position;
        agent.movement = None;
        debug!(agent = %id, %position, "Teleported");
        Ok(())
    }

    /// Stops the agent where it stands. Idle agents are left untouched.
    pub fn cancel_move(&mut self, id: AgentId) -> Result<(), MoveError> {
        let slot = self.slot(id)?;
        if self.agents[slot].movement.take().is_some() {
            debug!(agent = %id, "Movement cancelled");
        }
        Ok(())
    }

    /// Moves an agent by `displacement` directly, validated like a tick step.
    ///
    /// Any in-flight movement is left as is; callers that want a direct step
    /// to take over cancel once it succeeds. A refused step changes nothing
    /// and records a [`MoveSignal::Rejected`] event.
    pub fn apply_step(&mut self, id: AgentId, displacement: WorldPosition) -> Result<(), MoveError> {
        let slot = self.slot(id)?;
        let candidate = self.agents[slot].position + displacement;
        if let Err(reason) = self.check_position(id, candidate) {
            debug!(agent = %id, position = %candidate, %reason, "Direct step rejected");
            let error = MoveError::Blocked(reason);
            self.record(
                id,
                MoveSignal::Rejected {
                    error: error.clone(),
                },
            );
            return Err(error);
        }

        let agent = &mut self.agents[slot];
        agent.position = candidate;
        if let Some(facing) = Direction::from_delta(displacement) {
            agent.facing = facing;
        }
        trace!(agent = %id, position = %candidate, "Applied direct step");
        Ok(())
    }

    /// Checks whether agent `id` may occupy `candidate`.
    ///
    /// Separation is strict: another agent closer than the radius blocks the
    /// candidate, unless it is already that close and the candidate moves
    /// away from it.
    pub fn validate(&self, id: AgentId, candidate: WorldPosition) -> Result<(), BlockReason> {
        self.check_position(id, candidate)
    }

    fn check_position(&self, id: AgentId, candidate: WorldPosition) -> Result<(), BlockReason> {
        self.check_terrain(candidate)?;
        let radius = self.config.separation_radius;
        let current = self.agent(id).map(Agent::position);
        match self.agents.iter().find(|other| {
            let gap = other.position.distance(candidate);
            other.id != id
                && gap < radius
                && current.is_none_or(|from| gap <= other.position.distance(from))
        }) {
            Some(other) => Err(BlockReason::Separation { other: other.id }),
            None => Ok(()),
        }
    }

    fn check_terrain(&self, position: WorldPosition) -> Result<(), BlockReason> {
        if !self.grid.world_bounds().contains(position) {
            return Err(BlockReason::OutOfBounds);
        }
        if !self.grid.is_walkable(position) {
            return Err(BlockReason::Unwalkable);
        }
        Ok(())
    }

    fn record(&mut self, agent: AgentId, signal: MoveSignal) {
        if self.events.len() == MAX_PENDING_EVENTS {
            if let Some(dropped) = self.events.pop_front() {
                debug!(agent = %dropped.agent, "Event queue full, dropping oldest signal");
            }
        }
        self.events.push_back(MovementEvent { agent, signal });
    }

    fn slot(&self, id: AgentId) -> Result<usize, MoveError> {
        self.index.get(&id).copied().ok_or(MoveError::AgentNotFound(id))
    }

    /// Current position of an agent.
    pub fn position(&self, id: AgentId) -> Option<WorldPosition> {
        self.agent(id).map(Agent::position)
    }

    /// Current facing of an agent.
    pub fn facing(&self, id: AgentId) -> Option<Direction> {
        self.agent(id).map(Agent::facing)
    }

    /// Returns `true` if the agent exists and is following a path.
    pub fn is_moving(&self, id: AgentId) -> bool {
        self.agent(id).is_some_and(Agent::is_moving)
    }

    /// Snapshot of the agent's in-flight movement.
    pub fn movement_state(&self, id: AgentId) -> Option<MovementSnapshot> {
        self.agent(id).and_then(Agent::movement)
    }

    /// Looks up an agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&slot| &self.agents[slot])
    }

    /// All agents in registration order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    /// Number of registered agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Takes every signal recorded since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<MovementEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilenav_navigation::{NavigationError, TileGrid};

    const DT: f32 = 1.0 / 60.0;

    fn coordinator(rows: &[&str]) -> MovementCoordinator<TileGrid> {
        let grid = TileGrid::from_ascii(rows, 32.0).unwrap();
        MovementCoordinator::new(grid, MovementConfig::default())
    }

    fn run_until_idle<G: GridMap>(coord: &mut MovementCoordinator<G>, id: AgentId, max_ticks: usize) -> TickOutcome {
        for _ in 0..max_ticks {
            match coord.tick(id, DT).unwrap() {
                TickOutcome::Moving => continue,
                other => return other,
            }
        }
        TickOutcome::Moving
    }

    #[test]
    fn test_register_and_remove() {
        let mut coord = coordinator(&["...", "...", "..#"]);
        coord.register_agent(AgentId(1), WorldPosition::new(16.0, 16.0)).unwrap();
        coord.register_agent(AgentId(2), WorldPosition::new(48.0, 16.0)).unwrap();
        coord.register_agent(AgentId(3), WorldPosition::new(16.0, 80.0)).unwrap();

        assert_eq!(
            coord.register_agent(AgentId(1), WorldPosition::new(48.0, 48.0)),
            Err(MoveError::DuplicateAgent(AgentId(1)))
        );
        assert_eq!(
            coord.register_agent(AgentId(4), WorldPosition::new(80.0, 80.0)),
            Err(MoveError::Blocked(BlockReason::Unwalkable))
        );
        assert_eq!(
            coord.register_agent(AgentId(4), WorldPosition::new(-1.0, 0.0)),
            Err(MoveError::Blocked(BlockReason::OutOfBounds))
        );

        let removed = coord.remove_agent(AgentId(2)).unwrap();
        assert_eq!(removed.id(), AgentId(2));
        assert_eq!(coord.agent_count(), 2);
        assert_eq!(coord.position(AgentId(3)), Some(WorldPosition::new(16.0, 80.0)));
        let order: Vec<_> = coord.agents().map(Agent::id).collect();
        assert_eq!(order, vec![AgentId(1), AgentId(3)]);
        assert_eq!(
            coord.remove_agent(AgentId(2)).unwrap_err(),
            MoveError::AgentNotFound(AgentId(2))
        );
    }

    #[test]
    fn test_unknown_agent() {
        let mut coord = coordinator(&["..", ".."]);
        let ghost = AgentId(99);
        assert_eq!(
            coord.request_move(ghost, WorldPosition::new(16.0, 16.0)),
            Err(MoveError::AgentNotFound(ghost))
        );
        assert_eq!(coord.tick(ghost, DT), Err(MoveError::AgentNotFound(ghost)));
        assert_eq!(coord.cancel_move(ghost), Err(MoveError::AgentNotFound(ghost)));
        assert!(!coord.is_moving(ghost));
        assert!(coord.position(ghost).is_none());
        assert!(coord.drain_events().is_empty());
    }

    #[test]
    fn test_request_out_of_bounds_rejected() {
        let mut coord = coordinator(&["...", "...", "..."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 16.0)).unwrap();

        let target = WorldPosition::new(96.0, 16.0); // Exactly on the far edge
        assert_eq!(coord.request_move(id, target), Err(MoveError::InvalidTarget(target)));
        assert!(!coord.is_moving(id));

        let events = coord.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].agent, id);
        assert!(matches!(
            events[0].signal,
            MoveSignal::Rejected {
                error: MoveError::InvalidTarget(_)
            }
        ));
        assert!(coord.drain_events().is_empty());
    }

    #[test]
    fn test_rejected_request_keeps_previous_movement() {
        // The top-right corner is walled in.
        let mut coord = coordinator(&["...#.", "...##", "....."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 16.0)).unwrap();
        coord.request_move(id, WorldPosition::new(16.0, 80.0)).unwrap();
        coord.tick(id, DT).unwrap();
        let before = coord.movement_state(id).unwrap();

        let err = coord.request_move(id, WorldPosition::new(144.0, 16.0)).unwrap_err();
        assert!(matches!(
            err,
            MoveError::NoPathFound(NavigationError::Unreachable { .. })
        ));
        assert_eq!(coord.movement_state(id), Some(before));
        assert_eq!(before.target, WorldPosition::new(16.0, 80.0));
    }

    #[test]
    fn test_walks_straight_line_and_arrives() {
        let mut coord = coordinator(&[".....", ".....", "....."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 48.0)).unwrap();
        coord.request_move(id, WorldPosition::new(144.0, 48.0)).unwrap();

        let snapshot = coord.movement_state(id).unwrap();
        assert_eq!(snapshot.path_len, 2);
        assert_eq!(snapshot.cursor, 0);
        assert!(coord.is_moving(id));

        assert_eq!(coord.tick(id, DT).unwrap(), TickOutcome::Moving);
        // First waypoint is the start tile center, so the cursor skipped it.
        assert_eq!(coord.movement_state(id).unwrap().cursor, 1);
        let p = coord.position(id).unwrap();
        assert!((p.x - (16.0 + 128.0 * DT)).abs() < 1e-4);
        assert_eq!(p.y, 48.0);
        assert_eq!(coord.facing(id), Some(Direction::Right));

        assert_eq!(run_until_idle(&mut coord, id, 120), TickOutcome::Arrived);
        assert!(!coord.is_moving(id));
        let p = coord.position(id).unwrap();
        assert!(p.distance(WorldPosition::new(144.0, 48.0)) <= coord.config().arrival_tolerance);

        let events = coord.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].signal, MoveSignal::Arrived { .. }));
        assert_eq!(coord.tick(id, DT).unwrap(), TickOutcome::Idle);
    }

    #[test]
    fn test_facing_follows_dominant_axis() {
        let mut coord = coordinator(&["...", "...", "...", "..."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(48.0, 112.0)).unwrap();
        coord.request_move(id, WorldPosition::new(48.0, 16.0)).unwrap();
        coord.tick(id, DT).unwrap();
        assert_eq!(coord.facing(id), Some(Direction::Up));
    }

    #[test]
    fn test_step_never_overshoots_waypoint() {
        let mut coord = coordinator(&["...", "..."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 16.0)).unwrap();
        coord.request_move(id, WorldPosition::new(80.0, 16.0)).unwrap();

        // One huge tick covers far more than the 64 units to go.
        assert_eq!(coord.tick(id, 10.0).unwrap(), TickOutcome::Moving);
        assert_eq!(coord.position(id), Some(WorldPosition::new(80.0, 16.0)));
        assert_eq!(coord.tick(id, DT).unwrap(), TickOutcome::Arrived);
    }

    #[test]
    fn test_zero_dt_does_not_move() {
        let mut coord = coordinator(&["...", "..."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 16.0)).unwrap();
        coord.request_move(id, WorldPosition::new(80.0, 16.0)).unwrap();
        assert_eq!(coord.tick(id, 0.0).unwrap(), TickOutcome::Moving);
        assert_eq!(coord.position(id), Some(WorldPosition::new(16.0, 16.0)));
    }

    #[test]
    fn test_blocked_when_terrain_changes_mid_path() {
        let mut coord = coordinator(&[".....", ".....", "....."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 48.0)).unwrap();
        coord.request_move(id, WorldPosition::new(144.0, 48.0)).unwrap();
        coord
            .grid_mut()
            .set_terrain(tilenav_navigation::TileCoord::new(2, 1), tilenav_navigation::TerrainClass::Blocked)
            .unwrap();

        let outcome = run_until_idle(&mut coord, id, 240);
        assert_eq!(outcome, TickOutcome::Blocked(BlockReason::Unwalkable));
        assert!(!coord.is_moving(id));
        // Stopped short of the blocked tile, which starts at x = 64.
        let p = coord.position(id).unwrap();
        assert!(p.x < 64.0);
        assert!(coord.grid().is_walkable(p));

        let events = coord.drain_events();
        assert!(matches!(
            events.as_slice(),
            [MovementEvent {
                signal: MoveSignal::Blocked {
                    reason: BlockReason::Unwalkable,
                    ..
                },
                ..
            }]
        ));
    }

    #[test]
    fn test_teleport() {
        let mut coord = coordinator(&["...", ".#.", "..."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 16.0)).unwrap();
        coord.request_move(id, WorldPosition::new(80.0, 80.0)).unwrap();

        assert_eq!(
            coord.teleport(id, WorldPosition::new(48.0, 48.0)),
            Err(MoveError::Blocked(BlockReason::Unwalkable))
        );
        assert!(coord.is_moving(id), "failed teleport keeps movement");

        coord.teleport(id, WorldPosition::new(80.0, 16.0)).unwrap();
        assert_eq!(coord.position(id), Some(WorldPosition::new(80.0, 16.0)));
        assert!(!coord.is_moving(id));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut coord = coordinator(&["....", "...."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 16.0)).unwrap();
        coord.cancel_move(id).unwrap();
        assert!(!coord.is_moving(id));

        coord.request_move(id, WorldPosition::new(112.0, 16.0)).unwrap();
        coord.tick(id, DT).unwrap();
        let stopped_at = coord.position(id);
        coord.cancel_move(id).unwrap();
        coord.cancel_move(id).unwrap();
        assert!(!coord.is_moving(id));
        assert_eq!(coord.tick(id, DT).unwrap(), TickOutcome::Idle);
        assert_eq!(coord.position(id), stopped_at);
        assert!(coord.drain_events().is_empty());
    }

    #[test]
    fn test_apply_step_validation() {
        let mut coord = coordinator(&["...", "..#"]);
        let a = AgentId(1);
        let b = AgentId(2);
        coord.register_agent(a, WorldPosition::new(16.0, 16.0)).unwrap();
        coord.register_agent(b, WorldPosition::new(48.0, 16.0)).unwrap();

        // 8 units right would put `a` 24 from `b`: allowed.
        coord.apply_step(a, WorldPosition::new(8.0, 0.0)).unwrap();
        assert_eq!(coord.facing(a), Some(Direction::Right));
        // Another 10 puts it 14 away.
        assert_eq!(
            coord.apply_step(a, WorldPosition::new(10.0, 0.0)),
            Err(MoveError::Blocked(BlockReason::Separation { other: b }))
        );
        assert_eq!(coord.position(a), Some(WorldPosition::new(24.0, 16.0)));
        assert_eq!(
            coord.apply_step(a, WorldPosition::new(0.0, -30.0)),
            Err(MoveError::Blocked(BlockReason::OutOfBounds))
        );
        assert_eq!(
            coord.apply_step(b, WorldPosition::new(32.0, 32.0)),
            Err(MoveError::Blocked(BlockReason::Unwalkable))
        );
        assert_eq!(coord.validate(a, WorldPosition::new(16.0, 48.0)), Ok(()));
    }

    #[test]
    fn test_refused_step_records_rejection() {
        let mut coord = coordinator(&["#.."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(36.0, 16.0)).unwrap();

        assert_eq!(
            coord.apply_step(id, WorldPosition::new(-8.0, 0.0)),
            Err(MoveError::Blocked(BlockReason::Unwalkable))
        );
        assert_eq!(
            coord.drain_events(),
            vec![MovementEvent {
                agent: id,
                signal: MoveSignal::Rejected {
                    error: MoveError::Blocked(BlockReason::Unwalkable)
                },
            }]
        );

        coord.apply_step(id, WorldPosition::new(8.0, 0.0)).unwrap();
        assert!(coord.drain_events().is_empty());
    }

    #[test]
    fn test_overlapping_agents_can_step_apart() {
        let mut coord = coordinator(&["....."]);
        let a = AgentId(1);
        let b = AgentId(2);
        coord.register_agent(a, WorldPosition::new(16.0, 16.0)).unwrap();
        coord.register_agent(b, WorldPosition::new(80.0, 16.0)).unwrap();
        // Teleport ignores separation: now only 8 apart.
        coord.teleport(b, WorldPosition::new(24.0, 16.0)).unwrap();

        // Still inside the radius, but farther than before.
        coord.apply_step(b, WorldPosition::new(4.0, 0.0)).unwrap();
        assert_eq!(coord.position(b), Some(WorldPosition::new(28.0, 16.0)));

        // Closing the gap again is refused for either agent.
        assert_eq!(
            coord.apply_step(b, WorldPosition::new(-2.0, 0.0)),
            Err(MoveError::Blocked(BlockReason::Separation { other: a }))
        );
        assert_eq!(
            coord.apply_step(a, WorldPosition::new(2.0, 0.0)),
            Err(MoveError::Blocked(BlockReason::Separation { other: b }))
        );
        coord.apply_step(a, WorldPosition::new(-8.0, 0.0)).unwrap();
        assert_eq!(coord.position(a), Some(WorldPosition::new(8.0, 16.0)));
    }

    #[test]
    fn test_undrained_events_are_capped() {
        let mut coord = coordinator(&["...", "...", "..."]);
        let id = AgentId(1);
        coord.register_agent(id, WorldPosition::new(16.0, 16.0)).unwrap();

        for i in 0..MAX_PENDING_EVENTS + 5 {
            let target = WorldPosition::new(1000.0 + i as f32, 16.0);
            assert!(coord.request_move(id, target).is_err());
        }

        let events = coord.drain_events();
        assert_eq!(events.len(), MAX_PENDING_EVENTS);
        // The five oldest rejections were dropped.
        assert_eq!(
            events[0].signal,
            MoveSignal::Rejected {
                error: MoveError::InvalidTarget(WorldPosition::new(1005.0, 16.0))
            }
        );
        assert!(coord.drain_events().is_empty());
    }

    #[test]
    fn test_separation_is_strict() {
        let mut coord = coordinator(&["....."]);
        let a = AgentId(1);
        coord.register_agent(a, WorldPosition::new(16.0, 16.0)).unwrap();
        coord.register_agent(AgentId(2), WorldPosition::new(48.0, 16.0)).unwrap();
        // Exactly at the radius is allowed.
        assert_eq!(coord.validate(a, WorldPosition::new(32.0, 16.0)), Ok(()));
        assert!(coord.validate(a, WorldPosition::new(32.5, 16.0)).is_err());
    }

    #[test]
    fn test_tick_all_counts_moving_agents() {
        let mut coord = coordinator(&[".....", ".....", "....."]);
        coord.register_agent(AgentId(1), WorldPosition::new(16.0, 16.0)).unwrap();
        coord.register_agent(AgentId(2), WorldPosition::new(16.0, 80.0)).unwrap();
        coord.register_agent(AgentId(3), WorldPosition::new(144.0, 48.0)).unwrap();
        coord.request_move(AgentId(1), WorldPosition::new(144.0, 16.0)).unwrap();
        coord.request_move(AgentId(2), WorldPosition::new(80.0, 80.0)).unwrap();

        assert_eq!(coord.tick_all(DT), 2);
        let mut ticks = 1;
        while coord.tick_all(DT) > 0 {
            ticks += 1;
            assert!(ticks < 600);
        }
        assert!(!coord.is_moving(AgentId(1)));
        assert!(!coord.is_moving(AgentId(2)));
        let arrived: Vec<_> = coord
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e.signal, MoveSignal::Arrived { .. }))
            .map(|e| e.agent)
            .collect();
        // Agent 2 has half as far to go.
        assert_eq!(arrived, vec![AgentId(2), AgentId(1)]);
    }
}
