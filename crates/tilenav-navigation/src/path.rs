//! The immutable waypoint sequence produced by path search.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::map::WorldPosition;

/// An ordered, non-empty sequence of world-space waypoints.
///
/// The first point is where the walk starts and the last is the resolved
/// target. A `Path` cannot be modified after construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Path {
    points: Vec<WorldPosition>,
}

impl Path {
    /// Wraps `points`, or returns `None` if there are none.
    pub fn new(points: Vec<WorldPosition>) -> Option<Self> {
        (!points.is_empty()).then_some(Self { points })
    }

    /// A path consisting of a single waypoint.
    pub fn single(point: WorldPosition) -> Self {
        Self {
            points: vec![point],
        }
    }

    /// Number of waypoints (always at least one).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; provided for API symmetry with [`Path::len`].
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First waypoint.
    pub fn first(&self) -> WorldPosition {
        self.points[0]
    }

    /// Last waypoint.
    pub fn last(&self) -> WorldPosition {
        self.points[self.points.len() - 1]
    }

    /// Waypoint at `index`, if any.
    pub fn get(&self, index: usize) -> Option<WorldPosition> {
        self.points.get(index).copied()
    }

    /// All waypoints in order.
    pub fn points(&self) -> &[WorldPosition] {
        &self.points
    }

    /// Sum of the straight-line segment lengths.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}
