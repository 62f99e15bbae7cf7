#![warn(missing_docs)]
#![doc = "Tile-grid navigation primitives."]
#![doc = ""]
#![doc = "This crate provides the [`GridMap`] capability, a dense [`TileGrid`] implementation,"]
#![doc = "a bounded, terrain-weighted A* [`PathFinder`] and line-of-sight path smoothing."]

pub mod astar;
pub mod error;
pub mod map;
pub mod path;
pub mod smoothing;

pub use astar::{Heuristic, PathFinder, PathResult, PathfinderConfig, nearest_open_tile};
pub use error::NavigationError;
pub use map::{GridMap, TerrainClass, TileCoord, TileGrid, WorldBounds, WorldPosition};
pub use path::Path;
pub use smoothing::{has_line_of_sight, smooth_path};
