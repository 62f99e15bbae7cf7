//! The capability the navigation core consumes from whatever owns the tile map.

use std::sync::Arc;

use parking_lot::RwLock;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{TileCoord, WorldBounds, WorldPosition};

/// Cost category of a tile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerrainClass {
    /// Cheaper than normal ground (roads, paths).
    Preferred,
    /// Normal ground.
    #[default]
    Standard,
    /// Passable but expensive (mud, shallow water).
    Discouraged,
    /// Never traversable.
    Blocked,
}

impl TerrainClass {
    /// Multiplier applied to the base edge cost of moving onto a tile of this
    /// class, or `None` when the tile cannot be entered.
    pub const fn cost_modifier(self) -> Option<f32> {
        match self {
            TerrainClass::Preferred => Some(0.7),
            TerrainClass::Standard => Some(1.0),
            TerrainClass::Discouraged => Some(2.5),
            TerrainClass::Blocked => None,
        }
    }

    /// Returns `true` for every class except [`TerrainClass::Blocked`].
    pub const fn is_walkable(self) -> bool {
        !matches!(self, TerrainClass::Blocked)
    }

    /// Map symbol used by [`crate::TileGrid::from_ascii`] and its `Display` impl.
    pub const fn symbol(self) -> char {
        match self {
            TerrainClass::Preferred => '=',
            TerrainClass::Standard => '.',
            TerrainClass::Discouraged => '~',
            TerrainClass::Blocked => '#',
        }
    }

    /// Parses a map symbol.
    pub const fn from_symbol(c: char) -> Option<Self> {
        match c {
            '=' => Some(TerrainClass::Preferred),
            '.' => Some(TerrainClass::Standard),
            '~' => Some(TerrainClass::Discouraged),
            '#' => Some(TerrainClass::Blocked),
            _ => None,
        }
    }
}

/// Read-only view of a tile map.
///
/// Implementors supply terrain, world bounds and tile size; everything else
/// (grid dimensions, world/tile conversion, walkability) has a default derived
/// from those. Queries are expected to be synchronous, side-effect free and
/// O(1).
///
/// `terrain_class` must return [`TerrainClass::Blocked`] for tiles outside the
/// grid.
pub trait GridMap {
    /// Terrain class of `tile`.
    fn terrain_class(&self, tile: TileCoord) -> TerrainClass;

    /// World extent covered by the grid.
    fn world_bounds(&self) -> WorldBounds;

    /// Edge length of one tile in world units.
    fn tile_size(&self) -> f32;

    /// Whether an agent may occupy `pos`.
    fn is_walkable(&self, pos: WorldPosition) -> bool {
        self.tile_at(pos)
            .is_some_and(|tile| self.terrain_class(tile).is_walkable())
    }

    /// Number of tile columns.
    fn grid_width(&self) -> i32 {
        (self.world_bounds().width / self.tile_size()).floor() as i32
    }

    /// Number of tile rows.
    fn grid_height(&self) -> i32 {
        (self.world_bounds().height / self.tile_size()).floor() as i32
    }

    /// Returns `true` if `tile` lies in `[0, grid_width) x [0, grid_height)`.
    fn contains_tile(&self, tile: TileCoord) -> bool {
        tile.col >= 0
            && tile.row >= 0
            && tile.col < self.grid_width()
            && tile.row < self.grid_height()
    }

    /// Tile containing `pos` by floor division, without a bounds check.
    fn tile_of(&self, pos: WorldPosition) -> TileCoord {
        let size = self.tile_size();
        TileCoord::new((pos.x / size).floor() as i32, (pos.y / size).floor() as i32)
    }

    /// Tile containing `pos`, or `None` if it falls outside the grid.
    fn tile_at(&self, pos: WorldPosition) -> Option<TileCoord> {
        let tile = self.tile_of(pos);
        self.contains_tile(tile).then_some(tile)
    }

    /// World-space center of `tile`.
    fn tile_center(&self, tile: TileCoord) -> WorldPosition {
        let size = self.tile_size();
        WorldPosition::new(
            (tile.col as f32 + 0.5) * size,
            (tile.row as f32 + 0.5) * size,
        )
    }

    /// Returns `true` if `tile` is on the grid and its center is walkable.
    fn is_tile_walkable(&self, tile: TileCoord) -> bool {
        self.contains_tile(tile) && self.is_walkable(self.tile_center(tile))
    }
}

impl<G: GridMap + ?Sized> GridMap for &G {
    fn terrain_class(&self, tile: TileCoord) -> TerrainClass {
        (**self).terrain_class(tile)
    }

    fn world_bounds(&self) -> WorldBounds {
        (**self).world_bounds()
    }

    fn tile_size(&self) -> f32 {
        (**self).tile_size()
    }

    fn is_walkable(&self, pos: WorldPosition) -> bool {
        (**self).is_walkable(pos)
    }
}

impl<G: GridMap + ?Sized> GridMap for Arc<G> {
    fn terrain_class(&self, tile: TileCoord) -> TerrainClass {
        (**self).terrain_class(tile)
    }

    fn world_bounds(&self) -> WorldBounds {
        (**self).world_bounds()
    }

    fn tile_size(&self) -> f32 {
        (**self).tile_size()
    }

    fn is_walkable(&self, pos: WorldPosition) -> bool {
        (**self).is_walkable(pos)
    }
}

/// Terrain that changes at runtime is shared behind a lock; each query takes
/// a short read guard so a writer can only slip in between queries.
impl<G: GridMap> GridMap for RwLock<G> {
    fn terrain_class(&self, tile: TileCoord) -> TerrainClass {
        self.read().terrain_class(tile)
    }

    fn world_bounds(&self) -> WorldBounds {
        self.read().world_bounds()
    }

    fn tile_size(&self) -> f32 {
        self.read().tile_size()
    }

    fn is_walkable(&self, pos: WorldPosition) -> bool {
        self.read().is_walkable(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Open 4x3 grid of 10-unit tiles with a single blocked tile at (1, 1).
    struct Fixture;

    impl GridMap for Fixture {
        fn terrain_class(&self, tile: TileCoord) -> TerrainClass {
            if !self.contains_tile(tile) || tile == TileCoord::new(1, 1) {
                TerrainClass::Blocked
            } else {
                TerrainClass::Standard
            }
        }

        fn world_bounds(&self) -> WorldBounds {
            WorldBounds::new(40.0, 30.0)
        }

        fn tile_size(&self) -> f32 {
            10.0
        }
    }

    #[test]
    fn test_derived_dimensions_and_conversion() {
        let grid = Fixture;
        assert_eq!(grid.grid_width(), 4);
        assert_eq!(grid.grid_height(), 3);
        assert_eq!(grid.tile_at(WorldPosition::new(25.0, 5.0)), Some(TileCoord::new(2, 0)));
        assert_eq!(grid.tile_at(WorldPosition::new(40.0, 5.0)), None);
        assert_eq!(grid.tile_at(WorldPosition::new(-1.0, 5.0)), None);
        assert_eq!(grid.tile_center(TileCoord::new(3, 2)), WorldPosition::new(35.0, 25.0));
    }

    #[test]
    fn test_default_walkability_follows_terrain() {
        let grid = Fixture;
        assert!(grid.is_walkable(WorldPosition::new(5.0, 5.0)));
        assert!(!grid.is_walkable(WorldPosition::new(15.0, 15.0)));
        assert!(!grid.is_walkable(WorldPosition::new(45.0, 5.0)));
        assert!(!grid.is_tile_walkable(TileCoord::new(-1, 0)));
    }

    #[test]
    fn test_wrappers_forward_queries() {
        let shared = Arc::new(RwLock::new(Fixture));
        assert!(!shared.is_walkable(WorldPosition::new(15.0, 15.0)));
        assert_eq!(shared.grid_width(), 4);
        let by_ref = &Fixture;
        assert_eq!(by_ref.terrain_class(TileCoord::new(0, 0)), TerrainClass::Standard);
    }

    #[test]
    fn test_terrain_symbols_round_trip() {
        for class in [
            TerrainClass::Preferred,
            TerrainClass::Standard,
            TerrainClass::Discouraged,
            TerrainClass::Blocked,
        ] {
            assert_eq!(TerrainClass::from_symbol(class.symbol()), Some(class));
        }
        assert_eq!(TerrainClass::from_symbol('x'), None);
        assert_eq!(TerrainClass::Blocked.cost_modifier(), None);
    }
}
