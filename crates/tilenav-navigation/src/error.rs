//! This module defines the error types used by the `tilenav-navigation` crate.

use crate::map::TileCoord;

/// Error type for navigation operations.
///
/// Covers both grid construction/access problems and the reasons a path
/// search can come back empty-handed.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationError {
    /// Error for an invalid tile size.
    /// This variant is returned when a tile size is provided that is not positive.
    InvalidTileSize(&'static str),
    /// Error for invalid grid dimensions.
    /// This variant is returned when grid width or height is zero or too large.
    InvalidDimensions(&'static str),
    /// Error for out-of-bounds access.
    /// This variant is returned when a tile outside the grid is addressed.
    OutOfBounds(&'static str),
    /// Error for invalid world coordinates.
    /// This variant is returned when a world position does not fall on any tile.
    InvalidWorldCoordinates(&'static str),
    /// A map row contained a character that is not a terrain symbol.
    InvalidMapSymbol(char),
    /// The target tile is blocked and no open tile exists within the
    /// substitute search radius.
    NoWalkableTarget {
        /// The blocked tile that was requested.
        target: TileCoord,
        /// Largest ring radius that was searched.
        radius: u32,
    },
    /// The search popped its full iteration budget without reaching the target.
    SearchBudgetExhausted {
        /// Number of nodes popped from the open set.
        nodes_explored: usize,
    },
    /// The open set ran dry: the target is not connected to the start.
    Unreachable {
        /// Number of nodes popped from the open set.
        nodes_explored: usize,
    },
}

impl core::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NavigationError::InvalidTileSize(msg) => write!(f, "Invalid tile size: {}", msg),
            NavigationError::InvalidDimensions(msg) => write!(f, "Invalid grid dimensions: {}", msg),
            NavigationError::OutOfBounds(msg) => write!(f, "Grid access out of bounds: {}", msg),
            NavigationError::InvalidWorldCoordinates(msg) => {
                write!(f, "Invalid world coordinates: {}", msg)
            }
            NavigationError::InvalidMapSymbol(c) => write!(f, "Invalid map symbol: {:?}", c),
            NavigationError::NoWalkableTarget { target, radius } => write!(
                f,
                "No walkable tile within {} tiles of blocked target {}",
                radius, target
            ),
            NavigationError::SearchBudgetExhausted { nodes_explored } => write!(
                f,
                "Search budget exhausted after {} nodes",
                nodes_explored
            ),
            NavigationError::Unreachable { nodes_explored } => {
                write!(f, "Target unreachable ({} nodes explored)", nodes_explored)
            }
        }
    }
}

impl core::error::Error for NavigationError {}
