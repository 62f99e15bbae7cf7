//! Line-of-sight path smoothing.
//!
//! A raw A* path visits every tile center along the way. Smoothing keeps only
//! the waypoints an agent actually has to turn at: from each kept waypoint it
//! jumps to the farthest later waypoint that can be reached in a straight line
//! without crossing a non-walkable tile.

use tracing::trace;

use crate::map::{GridMap, TileCoord, WorldPosition};
use crate::path::Path;

// Tolerance for treating a segment as passing exactly through a tile corner.
const CORNER_EPSILON: f32 = 1e-6;

/// Greedy line-of-sight reduction of `path`.
///
/// Endpoints are preserved exactly, the result is never longer than the input,
/// and paths of one or two points are returned unchanged.
pub fn smooth_path<G: GridMap + ?Sized>(grid: &G, path: &Path) -> Path {
    let points = path.points();
    let n = points.len();
    if n <= 2 {
        return path.clone();
    }

    let mut kept = vec![points[0]];
    let mut current = 0;
    while current < n - 1 {
        // Fall back to the very next waypoint, which is always reachable.
        let mut next = current + 1;
        for candidate in (current + 2..n).rev() {
            if has_line_of_sight(grid, points[current], points[candidate]) {
                next = candidate;
                break;
            }
        }
        kept.push(points[next]);
        current = next;
    }

    trace!(raw = n, smoothed = kept.len(), "Smoothed path");
    Path::new(kept).unwrap_or_else(|| path.clone())
}

/// Returns `true` if the straight segment `from -> to` only crosses walkable
/// tiles.
///
/// Tiles are visited with a grid traversal (Amanatides & Woo). When the
/// segment passes exactly through a tile corner, both tiles sharing that
/// corner must be walkable as well.
pub fn has_line_of_sight<G: GridMap + ?Sized>(grid: &G, from: WorldPosition, to: WorldPosition) -> bool {
    let size = grid.tile_size();
    let (x0, y0) = (from.x / size, from.y / size);
    let (x1, y1) = (to.x / size, to.y / size);

    let mut tile = grid.tile_of(from);
    let end = grid.tile_of(to);

    let dx = x1 - x0;
    let dy = y1 - y0;
    let step_col = if dx > 0.0 { 1 } else if dx < 0.0 { -1 } else { 0 };
    let step_row = if dy > 0.0 { 1 } else if dy < 0.0 { -1 } else { 0 };

    // Parametric distance (0..1 along the segment) to the next column/row boundary.
    let mut t_max_x = boundary_t(x0, dx, tile.col);
    let mut t_max_y = boundary_t(y0, dy, tile.row);
    let t_delta_x = if dx != 0.0 { (1.0 / dx).abs() } else { f32::INFINITY };
    let t_delta_y = if dy != 0.0 { (1.0 / dy).abs() } else { f32::INFINITY };

    let max_steps = (end.col - tile.col).abs() + (end.row - tile.row).abs() + 1;
    for _ in 0..=max_steps {
        if !grid.is_tile_walkable(tile) {
            return false;
        }
        if tile == end {
            return true;
        }

        if (t_max_x - t_max_y).abs() <= CORNER_EPSILON {
            if !grid.is_tile_walkable(tile.offset(step_col, 0))
                || !grid.is_tile_walkable(tile.offset(0, step_row))
            {
                return false;
            }
            tile = TileCoord::new(tile.col + step_col, tile.row + step_row);
            t_max_x += t_delta_x;
            t_max_y += t_delta_y;
        } else if t_max_x < t_max_y {
            tile.col += step_col;
            t_max_x += t_delta_x;
        } else {
            tile.row += step_row;
            t_max_y += t_delta_y;
        }
    }

    // Floating-point drift walked us past the end tile; be conservative.
    false
}

fn boundary_t(origin: f32, delta: f32, cell: i32) -> f32 {
    if delta > 0.0 {
        ((cell + 1) as f32 - origin) / delta
    } else if delta < 0.0 {
        (cell as f32 - origin) / delta
    } else {
        f32::INFINITY
    }
}
