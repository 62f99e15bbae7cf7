//! A dense in-memory terrain grid.

// NOTES:
// - The grid is anchored at the world origin; there is no offset origin.
// - Rows grow downward (screen convention), so row 0 is the first ASCII line.

use rand::Rng;

use super::{GridMap, TerrainClass, TileCoord, WorldBounds, WorldPosition};
use crate::error::NavigationError;

/// A dense 2D terrain grid.
///
/// This is the in-memory [`GridMap`] used by tests, examples and the demo
/// simulation. Each cell stores a [`TerrainClass`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileGrid {
    /// Width of the grid in tiles
    width: usize,
    /// Height of the grid in tiles
    height: usize,
    /// Edge length of a tile in world units
    tile_size: f32,
    /// Row-major terrain for each tile
    data: Vec<TerrainClass>,
}

impl TileGrid {
    /// Creates a new, fully [`TerrainClass::Standard`] grid.
    ///
    /// # Arguments
    /// * `width` - Width of the grid in tiles
    /// * `height` - Height of the grid in tiles
    /// * `tile_size` - Edge length of a tile in world units
    ///
    /// # Returns
    /// * `Result<Self, NavigationError>` - The created grid or an error if parameters are invalid
    pub fn new(width: usize, height: usize, tile_size: f32) -> Result<Self, NavigationError> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(NavigationError::InvalidTileSize("Tile size must be positive and finite"));
        }
        if width == 0 || height == 0 {
            return Err(NavigationError::InvalidDimensions("Width and height must be non-zero"));
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(NavigationError::InvalidDimensions("Grid dimensions exceed i32 range"));
        }
        let Some(len) = width.checked_mul(height) else {
            return Err(NavigationError::InvalidDimensions(
                "Grid dimensions too large, would cause overflow",
            ));
        };

        Ok(TileGrid {
            width,
            height,
            tile_size,
            data: vec![TerrainClass::Standard; len],
        })
    }

    /// Builds a grid from ASCII rows, one character per tile.
    ///
    /// `#` is blocked, `.` standard, `=` preferred and `~` discouraged. All rows
    /// must have the same length.
    ///
    /// # Arguments
    /// * `rows` - Map rows, top (row 0) first
    /// * `tile_size` - Edge length of a tile in world units
    pub fn from_ascii<S: AsRef<str>>(rows: &[S], tile_size: f32) -> Result<Self, NavigationError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
        let mut grid = TileGrid::new(width, height, tile_size)?;

        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            if line.chars().count() != width {
                return Err(NavigationError::InvalidDimensions("Map rows must all have the same length"));
            }
            for (col, symbol) in line.chars().enumerate() {
                let class = TerrainClass::from_symbol(symbol)
                    .ok_or(NavigationError::InvalidMapSymbol(symbol))?;
                grid.data[row * width + col] = class;
            }
        }
        Ok(grid)
    }

    /// Width in tiles.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> usize {
        self.height
    }

    fn get_index(&self, tile: TileCoord) -> Option<usize> {
        let col = usize::try_from(tile.col).ok()?;
        let row = usize::try_from(tile.row).ok()?;
        (col < self.width && row < self.height).then(|| row * self.width + col)
    }

    /// Gets the terrain of a tile.
    ///
    /// # Returns
    /// * `Result<TerrainClass, NavigationError>` - The terrain or an error if out of bounds
    pub fn terrain(&self, tile: TileCoord) -> Result<TerrainClass, NavigationError> {
        self.get_index(tile)
            .map(|idx| self.data[idx])
            .ok_or(NavigationError::OutOfBounds("Tile index out of bounds"))
    }

    /// Sets the terrain of a tile.
    ///
    /// # Returns
    /// * `Result<(), NavigationError>` - Success or error if out of bounds
    pub fn set_terrain(&mut self, tile: TileCoord, class: TerrainClass) -> Result<(), NavigationError> {
        let idx = self
            .get_index(tile)
            .ok_or(NavigationError::OutOfBounds("Tile index out of bounds"))?;
        self.data[idx] = class;
        Ok(())
    }

    /// Sets the terrain of the tile under a world position.
    pub fn set_terrain_at_world(
        &mut self,
        pos: WorldPosition,
        class: TerrainClass,
    ) -> Result<(), NavigationError> {
        let tile = self
            .tile_at(pos)
            .ok_or(NavigationError::InvalidWorldCoordinates("World position outside grid bounds"))?;
        self.set_terrain(tile, class)
    }

    /// Fills the inclusive tile rectangle `min..=max`, clipped to the grid.
    pub fn fill_rect(&mut self, min: TileCoord, max: TileCoord, class: TerrainClass) {
        for row in min.row.max(0)..=max.row {
            for col in min.col.max(0)..=max.col {
                if let Some(idx) = self.get_index(TileCoord::new(col, row)) {
                    self.data[idx] = class;
                }
            }
        }
    }

    /// Scatters `count` rectangular blocked patches with sides of at most
    /// `max_size` tiles.
    ///
    /// Randomness comes from the caller so runs can be reproduced with a
    /// seeded generator.
    pub fn scatter_obstacles<R: Rng + ?Sized>(&mut self, rng: &mut R, count: usize, max_size: usize) {
        let max_size = max_size.max(1);
        for _ in 0..count {
            let col = rng.random_range(0..self.width) as i32;
            let row = rng.random_range(0..self.height) as i32;
            let w = rng.random_range(1..=max_size) as i32;
            let h = rng.random_range(1..=max_size) as i32;
            self.fill_rect(
                TileCoord::new(col, row),
                TileCoord::new(col + w - 1, row + h - 1),
                TerrainClass::Blocked,
            );
        }
    }

    /// Resets every tile to standard terrain.
    pub fn clear(&mut self) {
        self.data.fill(TerrainClass::Standard);
    }

    /// Number of tiles with the given class.
    pub fn count(&self, class: TerrainClass) -> usize {
        self.data.iter().filter(|c| **c == class).count()
    }
}

impl GridMap for TileGrid {
    fn terrain_class(&self, tile: TileCoord) -> TerrainClass {
        self.terrain(tile).unwrap_or(TerrainClass::Blocked)
    }

    fn world_bounds(&self) -> WorldBounds {
        WorldBounds::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn grid_width(&self) -> i32 {
        self.width as i32
    }

    fn grid_height(&self) -> i32 {
        self.height as i32
    }
}

impl std::fmt::Display for TileGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "TileGrid ({}x{}, tile size: {:.1})",
            self.width, self.height, self.tile_size
        )?;
        for row in self.data.chunks(self.width) {
            for class in row {
                write!(f, "{}", class.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
