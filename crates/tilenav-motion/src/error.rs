//! This module defines the error types used by the `tilenav-motion` crate.

use tilenav_navigation::{NavigationError, WorldPosition};

use crate::agent::AgentId;

/// Why a candidate position was refused.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlockReason {
    /// The position lies outside the world bounds.
    OutOfBounds,
    /// The position lies on a non-walkable tile.
    Unwalkable,
    /// Another agent is closer than the separation radius.
    Separation {
        /// The agent in the way.
        other: AgentId,
    },
}

impl core::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BlockReason::OutOfBounds => write!(f, "outside world bounds"),
            BlockReason::Unwalkable => write!(f, "tile is not walkable"),
            BlockReason::Separation { other } => write!(f, "too close to {}", other),
        }
    }
}

/// Error type for movement requests.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveError {
    /// The requested target is outside the world bounds.
    InvalidTarget(WorldPosition),
    /// The path finder could not produce a route.
    NoPathFound(NavigationError),
    /// No agent is registered under this id.
    AgentNotFound(AgentId),
    /// An agent with this id is already registered.
    DuplicateAgent(AgentId),
    /// The requested position cannot be occupied.
    Blocked(BlockReason),
}

impl core::fmt::Display for MoveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MoveError::InvalidTarget(pos) => write!(f, "Invalid target: {} is outside the world", pos),
            MoveError::NoPathFound(e) => write!(f, "No path found: {}", e),
            MoveError::AgentNotFound(id) => write!(f, "Agent not found: {}", id),
            MoveError::DuplicateAgent(id) => write!(f, "Agent already registered: {}", id),
            MoveError::Blocked(reason) => write!(f, "Position blocked: {}", reason),
        }
    }
}

impl core::error::Error for MoveError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            MoveError::NoPathFound(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NavigationError> for MoveError {
    fn from(e: NavigationError) -> Self {
        MoveError::NoPathFound(e)
    }
}
