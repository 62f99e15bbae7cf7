//! Tile and world coordinate types.

use core::fmt;
use core::ops::{Add, Mul, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents a tile in grid coordinates (column and row indices).
///
/// Coordinates are signed so that neighbor and ring offsets can step off the
/// grid; callers check membership with [`crate::GridMap::contains_tile`].
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileCoord {
    /// The column index in the grid.
    pub col: i32,
    /// The row index in the grid.
    pub row: i32,
}

impl TileCoord {
    /// Creates a new `TileCoord`.
    #[must_use]
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Returns the tile displaced by `(dc, dr)`.
    #[must_use]
    pub const fn offset(self, dc: i32, dr: i32) -> Self {
        Self::new(self.col + dc, self.row + dr)
    }

    /// Chebyshev (ring) distance between two tiles.
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.col - other.col).abs().max((self.row - other.row).abs())
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.col, self.row)
    }
}

/// Represents a point in continuous world coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldPosition {
    /// The x-coordinate in world units.
    pub x: f32,
    /// The y-coordinate in world units. Rows grow with `y`.
    pub y: f32,
}

impl WorldPosition {
    /// The world origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Creates a new `WorldPosition`.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length of the position treated as a vector.
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f32 {
        (other - self).length()
    }
}

impl Add for WorldPosition {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for WorldPosition {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for WorldPosition {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for WorldPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Extent of the world, anchored at the origin.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldBounds {
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
}

impl WorldBounds {
    /// Creates new bounds.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if `p` lies in `[0, width) x [0, height)`.
    ///
    /// A point exactly on the far edge is considered outside, matching the
    /// floor-division used to map positions onto tiles.
    pub fn contains(&self, p: WorldPosition) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width && p.y < self.height
    }
}
