//! Map-related functionality for navigation.
//!
//! This module provides the [`GridMap`] capability consumed by the search and
//! smoothing code, the coordinate types shared by everything, and
//! [`TileGrid`], a dense in-memory implementation.

pub mod grid_map;
pub mod point_types;
pub mod tile_grid;

pub use grid_map::{GridMap, TerrainClass};
pub use point_types::{TileCoord, WorldBounds, WorldPosition};
pub use tile_grid::TileGrid;
