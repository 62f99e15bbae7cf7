//! Agents and their per-agent movement state.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tilenav_navigation::{Path, WorldPosition};

/// Opaque agent identifier chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// One of the four cardinal facings.
///
/// World `y` grows downward, so a positive `dy` faces [`Direction::Down`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    /// Toward negative `y`.
    Up,
    /// Toward positive `y`.
    #[default]
    Down,
    /// Toward negative `x`.
    Left,
    /// Toward positive `x`.
    Right,
}

impl Direction {
    /// Facing for a displacement, chosen by the dominant axis.
    ///
    /// Horizontal wins when `|dx| == |dy|`. A zero displacement has no facing.
    pub fn from_delta(delta: WorldPosition) -> Option<Self> {
        let (dx, dy) = (delta.x, delta.y);
        if dx == 0.0 && dy == 0.0 {
            return None;
        }
        if dx.abs() >= dy.abs() {
            Some(if dx > 0.0 { Direction::Right } else { Direction::Left })
        } else {
            Some(if dy > 0.0 { Direction::Down } else { Direction::Up })
        }
    }

    /// Displacement of `distance` world units in this direction.
    pub fn offset(self, distance: f32) -> WorldPosition {
        match self {
            Direction::Up => WorldPosition::new(0.0, -distance),
            Direction::Down => WorldPosition::new(0.0, distance),
            Direction::Left => WorldPosition::new(-distance, 0.0),
            Direction::Right => WorldPosition::new(distance, 0.0),
        }
    }
}

/// Path being followed by a moving agent.
///
/// The agent is moving exactly when it holds a `MovementState`.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementState {
    pub(crate) target: WorldPosition,
    pub(crate) path: Path,
    pub(crate) cursor: usize,
}

impl MovementState {
    pub(crate) fn new(target: WorldPosition, path: Path) -> Self {
        Self {
            target,
            path,
            cursor: 0,
        }
    }

    /// The waypoint currently being approached, if any remain.
    pub(crate) fn current_waypoint(&self) -> Option<WorldPosition> {
        self.path.get(self.cursor)
    }

    pub(crate) fn snapshot(&self) -> MovementSnapshot {
        MovementSnapshot {
            target: self.target,
            path_len: self.path.len(),
            cursor: self.cursor,
        }
    }
}

/// Read-only view of an agent's in-flight movement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MovementSnapshot {
    /// The position originally requested.
    pub target: WorldPosition,
    /// Number of waypoints in the smoothed path.
    pub path_len: usize,
    /// Index of the waypoint currently being approached.
    pub cursor: usize,
}

/// A positioned entity driven by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) position: WorldPosition,
    pub(crate) facing: Direction,
    pub(crate) movement: Option<MovementState>,
}

impl Agent {
    pub(crate) fn new(id: AgentId, position: WorldPosition) -> Self {
        Self {
            id,
            position,
            facing: Direction::default(),
            movement: None,
        }
    }

    /// The agent's identifier.
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current world position.
    pub fn position(&self) -> WorldPosition {
        self.position
    }

    /// Current facing.
    pub fn facing(&self) -> Direction {
        self.facing
    }

    /// Returns `true` while the agent is following a path.
    pub fn is_moving(&self) -> bool {
        self.movement.is_some()
    }

    /// Snapshot of the in-flight movement, if any.
    pub fn movement(&self) -> Option<MovementSnapshot> {
        self.movement.as_ref().map(MovementState::snapshot)
    }
}
