use std::collections::HashSet;

use tilenav_navigation::{GridMap, PathFinder, PathfinderConfig, TileGrid, WorldPosition, smooth_path};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .init();

    // '#' = blocked, '.' = standard, '=' = road, '~' = mud
    let grid = TileGrid::from_ascii(
        &[
            "..........",
            ".##...=.##",
            "....#.=...",
            "..####=#..",
            ".....#=#..",
            ".###.#=##.",
            "...#..=...",
            ".#.#.###..",
            ".#~~~~~.#.",
            "...###....",
        ],
        32.0,
    )
    .expect("map rows are valid");

    println!("{}", grid);

    let start = WorldPosition::new(16.0, 16.0);
    let goal = WorldPosition::new(304.0, 304.0);
    let finder = PathFinder::new(PathfinderConfig::default());

    match finder.find_path_detailed(&grid, start, goal) {
        Ok(result) => {
            println!("{}", result);
            let smoothed = smooth_path(&grid, &result.path);
            println!("Raw path:      {}", result.path);
            println!("Smoothed path: {}", smoothed);

            let on_path: HashSet<_> = result.path.points().iter().map(|p| grid.tile_of(*p)).collect();
            println!("\nGrid with path:");
            for row in 0..grid.grid_height() {
                for col in 0..grid.grid_width() {
                    let tile = tilenav_navigation::TileCoord::new(col, row);
                    if on_path.contains(&tile) {
                        print!("*");
                    } else {
                        print!("{}", grid.terrain_class(tile).symbol());
                    }
                }
                println!();
            }
        }
        Err(e) => println!("No path found: {}", e),
    }
}
