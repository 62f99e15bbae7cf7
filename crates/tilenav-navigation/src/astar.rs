//! Bounded, terrain-weighted A* search over a [`GridMap`].

/*

A* = f(n) = g(n) + h(n)

Where:
    n = a tile in the grid
    g(n) = terrain-weighted cost from the start tile to n
    h(n) = estimated cost from n to the target (heuristic)
    f(n) = total estimated cost of a path through n

Initialize:
    - open set (indexed min-heap keyed by f) holding the start tile
    - closed set of tiles already expanded
    - g(start) = 0, f(start) = h(start)

Loop (at most `max_iterations` pops):
    - pop the tile with lowest f
    - if it is the target, walk parent links back to the start
    - close it
    - for each of the 8 neighbors that is on the grid, not blocked, not closed,
      and (for diagonals) not cutting a blocked corner:
        - tentative g = g(n) + base step cost * terrain modifier
        - if the neighbor is already open and this is cheaper, decrease its key
        - otherwise open it

*/

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::NavigationError;
use crate::map::{GridMap, TerrainClass, TileCoord, WorldPosition};
use crate::path::Path;

/// Base cost of an orthogonal step.
pub const ORTHOGONAL_COST: f32 = 1.0;
/// Base cost of a diagonal step.
pub const DIAGONAL_COST: f32 = 1.414;

/// Neighbor offsets in expansion order: N, E, S, W, NE, SE, SW, NW.
const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Distance estimate used to order the open set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Heuristic {
    /// `|dx| + |dy|`. Overestimates diagonal travel, so the search is greedier
    /// and faster but results are not guaranteed to be cost-optimal.
    #[default]
    Manhattan,
    /// `max(dx, dy) + (sqrt(2) - 1) * min(dx, dy)`. Admissible on the
    /// unweighted 8-connected grid.
    Octile,
}

impl Heuristic {
    /// Estimated cost between two tiles.
    pub fn estimate(self, a: TileCoord, b: TileCoord) -> f32 {
        let dx = (a.col - b.col).abs() as f32;
        let dy = (a.row - b.row).abs() as f32;
        match self {
            Heuristic::Manhattan => dx + dy,
            Heuristic::Octile => dx.max(dy) + (core::f32::consts::SQRT_2 - 1.0) * dx.min(dy),
        }
    }
}

/// Tunables for [`PathFinder`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PathfinderConfig {
    /// Maximum number of open-set pops before the search gives up.
    pub max_iterations: usize,
    /// Largest ring radius searched for a substitute when the target tile is blocked.
    pub substitute_search_radius: u32,
    /// Heuristic used to order the open set.
    pub heuristic: Heuristic,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            substitute_search_radius: 10,
            heuristic: Heuristic::Manhattan,
        }
    }
}

/// Represents the result of a successful search with metadata.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathResult {
    /// The computed path, start tile center first.
    pub path: Path,
    /// Terrain-weighted cost of the path.
    pub total_cost: f32,
    /// The number of nodes popped from the open set.
    pub nodes_explored: usize,
    /// Set when the requested target tile was blocked and this tile was
    /// searched for instead.
    pub substitute_target: Option<TileCoord>,
}

impl PathResult {
    /// Returns the path.
    pub fn into_path(self) -> Path {
        self.path
    }
}

impl fmt::Display for PathResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PathResult {{ path_length: {}, total_cost: {:.3}, nodes_explored: {}",
            self.path.len(),
            self.total_cost,
            self.nodes_explored
        )?;
        if let Some(tile) = self.substitute_target {
            write!(f, ", substitute_target: {}", tile)?;
        }
        write!(f, " }}")
    }
}

#[derive(Debug, Clone, Copy)]
struct SearchNode {
    tile: TileCoord,
    g: f32,
    h: f32,
    parent: Option<usize>,
}

impl SearchNode {
    fn f(&self) -> f32 {
        self.g + self.h
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f32,
    h: f32,
    seq: u64,
    node: usize,
    tile: TileCoord,
}

impl OpenEntry {
    // Lower f first; ties go to the entry closer to the target, then FIFO.
    fn precedes(&self, other: &Self) -> bool {
        self.f
            .total_cmp(&other.f)
            .then_with(|| self.h.total_cmp(&other.h))
            .then_with(|| self.seq.cmp(&other.seq))
            == Ordering::Less
    }
}

/// Binary min-heap with a tile -> slot index so an open tile can be found in
/// O(1) and its key decreased in O(log n).
#[derive(Debug, Default)]
struct OpenSet {
    heap: Vec<OpenEntry>,
    slots: HashMap<TileCoord, usize>,
    next_seq: u64,
}

impl OpenSet {
    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Node index of `tile` if it is currently open.
    fn node_of(&self, tile: TileCoord) -> Option<usize> {
        self.slots.get(&tile).map(|&slot| self.heap[slot].node)
    }

    fn push(&mut self, tile: TileCoord, node: usize, f: f32, h: f32) {
        let slot = self.heap.len();
        self.heap.push(OpenEntry {
            f,
            h,
            seq: self.next_seq,
            node,
            tile,
        });
        self.next_seq += 1;
        self.slots.insert(tile, slot);
        self.sift_up(slot);
    }

    fn pop(&mut self) -> Option<OpenEntry> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let entry = self.heap.pop()?;
        self.slots.remove(&entry.tile);
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(entry)
    }

    fn decrease_key(&mut self, tile: TileCoord, f: f32) {
        if let Some(&slot) = self.slots.get(&tile) {
            self.heap[slot].f = f;
            self.sift_up(slot);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.slots.insert(self.heap[a].tile, a);
        self.slots.insert(self.heap[b].tile, b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.heap[slot].precedes(&self.heap[parent]) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            let right = left + 1;
            let mut best = slot;
            if left < len && self.heap[left].precedes(&self.heap[best]) {
                best = left;
            }
            if right < len && self.heap[right].precedes(&self.heap[best]) {
                best = right;
            }
            if best == slot {
                break;
            }
            self.swap(slot, best);
            slot = best;
        }
    }
}

/// Bounded A* search over a [`GridMap`].
///
/// A `PathFinder` only holds configuration. Every call allocates its own open
/// set, closed set and node pool, so one instance can serve any number of
/// agents within a frame without state leaking between searches.
#[derive(Debug, Clone, Default)]
pub struct PathFinder {
    config: PathfinderConfig,
}

impl PathFinder {
    /// Creates a path finder with the given configuration.
    pub fn new(config: PathfinderConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &PathfinderConfig {
        &self.config
    }

    /// Finds a path between two world positions.
    ///
    /// # Returns
    /// * `Option<Path>` - Tile centers from the start tile to the (possibly
    ///   substituted) target tile, or `None` when no path was found.
    pub fn find_path<G: GridMap + ?Sized>(
        &self,
        grid: &G,
        start: WorldPosition,
        end: WorldPosition,
    ) -> Option<Path> {
        self.find_path_detailed(grid, start, end)
            .ok()
            .map(PathResult::into_path)
    }

    /// Finds a path between two world positions with detailed results.
    ///
    /// # Arguments
    /// * `grid` - The map to search.
    /// * `start` - Starting point in world coordinates.
    /// * `end` - Target point in world coordinates.
    ///
    /// # Returns
    /// * `Result<PathResult, NavigationError>` - The path with search metadata, or why none exists.
    pub fn find_path_detailed<G: GridMap + ?Sized>(
        &self,
        grid: &G,
        start: WorldPosition,
        end: WorldPosition,
    ) -> Result<PathResult, NavigationError> {
        let start_tile = grid
            .tile_at(start)
            .ok_or(NavigationError::OutOfBounds("Start position outside grid"))?;
        let end_tile = grid
            .tile_at(end)
            .ok_or(NavigationError::OutOfBounds("End position outside grid"))?;

        if start_tile == end_tile {
            return Ok(PathResult {
                path: Path::single(end),
                total_cost: 0.0,
                nodes_explored: 0,
                substitute_target: None,
            });
        }

        let mut substitute_target = None;
        let target = if grid.terrain_class(end_tile) == TerrainClass::Blocked {
            let radius = self.config.substitute_search_radius;
            let tile = nearest_open_tile(grid, end_tile, radius).ok_or(
                NavigationError::NoWalkableTarget {
                    target: end_tile,
                    radius,
                },
            )?;
            debug!(requested = %end_tile, substitute = %tile, "Target tile blocked, using substitute");
            substitute_target = Some(tile);
            tile
        } else {
            end_tile
        };

        if target == start_tile {
            return Ok(PathResult {
                path: Path::single(grid.tile_center(start_tile)),
                total_cost: 0.0,
                nodes_explored: 0,
                substitute_target,
            });
        }

        let result = self.search(grid, start_tile, target);
        match &result {
            Ok((path, cost, nodes_explored)) => debug!(
                from = %start_tile,
                to = %target,
                path_length = path.len(),
                total_cost = cost,
                nodes_explored,
                "Path found"
            ),
            Err(e) => debug!(from = %start_tile, to = %target, error = %e, "Path search failed"),
        }
        let (path, total_cost, nodes_explored) = result?;
        Ok(PathResult {
            path,
            total_cost,
            nodes_explored,
            substitute_target,
        })
    }

    fn search<G: GridMap + ?Sized>(
        &self,
        grid: &G,
        start: TileCoord,
        target: TileCoord,
    ) -> Result<(Path, f32, usize), NavigationError> {
        let heuristic = self.config.heuristic;
        let mut nodes: Vec<SearchNode> = Vec::new();
        let mut open = OpenSet::default();
        let mut closed: HashSet<TileCoord> = HashSet::new();
        let mut nodes_explored = 0;

        let h0 = heuristic.estimate(start, target);
        nodes.push(SearchNode {
            tile: start,
            g: 0.0,
            h: h0,
            parent: None,
        });
        open.push(start, 0, h0, h0);

        while !open.is_empty() {
            if nodes_explored >= self.config.max_iterations {
                return Err(NavigationError::SearchBudgetExhausted { nodes_explored });
            }
            let Some(entry) = open.pop() else { break };
            nodes_explored += 1;

            let current = nodes[entry.node];
            trace!(tile = %current.tile, g = current.g, f = current.f(), "Expanding node");

            if current.tile == target {
                let path = reconstruct_path(grid, &nodes, entry.node)
                    .ok_or(NavigationError::Unreachable { nodes_explored })?;
                return Ok((path, current.g, nodes_explored));
            }
            closed.insert(current.tile);

            for (dc, dr) in DIRECTIONS {
                let neighbor = current.tile.offset(dc, dr);
                if !grid.contains_tile(neighbor) || closed.contains(&neighbor) {
                    continue;
                }
                let Some(modifier) = grid.terrain_class(neighbor).cost_modifier() else {
                    continue;
                };
                let diagonal = dc != 0 && dr != 0;
                if diagonal
                    && !(is_passable(grid, current.tile.offset(dc, 0))
                        && is_passable(grid, current.tile.offset(0, dr)))
                {
                    // Would cut a blocked corner.
                    continue;
                }

                let base = if diagonal { DIAGONAL_COST } else { ORTHOGONAL_COST };
                let tentative_g = current.g + base * modifier;

                if let Some(idx) = open.node_of(neighbor) {
                    if tentative_g < nodes[idx].g {
                        nodes[idx].g = tentative_g;
                        nodes[idx].parent = Some(entry.node);
                        open.decrease_key(neighbor, nodes[idx].f());
                    }
                } else {
                    let h = heuristic.estimate(neighbor, target);
                    let idx = nodes.len();
                    nodes.push(SearchNode {
                        tile: neighbor,
                        g: tentative_g,
                        h,
                        parent: Some(entry.node),
                    });
                    open.push(neighbor, idx, tentative_g + h, h);
                }
            }
        }

        Err(NavigationError::Unreachable { nodes_explored })
    }
}

fn is_passable<G: GridMap + ?Sized>(grid: &G, tile: TileCoord) -> bool {
    grid.contains_tile(tile) && grid.terrain_class(tile).is_walkable()
}

/// Reconstructs the path from parent links, start first.
fn reconstruct_path<G: GridMap + ?Sized>(grid: &G, nodes: &[SearchNode], mut current: usize) -> Option<Path> {
    let mut points = vec![grid.tile_center(nodes[current].tile)];
    while let Some(parent) = nodes[current].parent {
        current = parent;
        points.push(grid.tile_center(nodes[current].tile));
    }
    points.reverse();
    Path::new(points)
}

/// Searches square rings of increasing radius around `center` for the
/// non-blocked tile nearest to it.
///
/// Within a ring the Euclidean-closest tile wins; ties keep the first tile in
/// row-major scan order.
pub fn nearest_open_tile<G: GridMap + ?Sized>(grid: &G, center: TileCoord, max_radius: u32) -> Option<TileCoord> {
    let max_radius = i32::try_from(max_radius).unwrap_or(i32::MAX);
    for radius in 1..=max_radius {
        let mut best: Option<(i32, TileCoord)> = None;
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                if dc.abs() != radius && dr.abs() != radius {
                    continue;
                }
                let tile = center.offset(dc, dr);
                if !is_passable(grid, tile) {
                    continue;
                }
                let dist2 = dc * dc + dr * dr;
                if best.is_none_or(|(d, _)| dist2 < d) {
                    best = Some((dist2, tile));
                }
            }
        }
        if let Some((_, tile)) = best {
            return Some(tile);
        }
    }
    None
}
