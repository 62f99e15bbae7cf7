use rand::SeedableRng;
use rand::rngs::StdRng;
use tilenav_navigation::{GridMap, TerrainClass, TileCoord, TileGrid, WorldPosition};

fn main() {
    // 20x20 grid of 16-unit tiles with 15 random obstacles, each at most 3 tiles on a side.
    let mut grid = TileGrid::new(20, 20, 16.0).expect("valid dimensions");
    let mut rng = StdRng::seed_from_u64(2024);
    grid.scatter_obstacles(&mut rng, 15, 3);

    // A road across the middle and a mud patch.
    grid.fill_rect(TileCoord::new(0, 10), TileCoord::new(19, 10), TerrainClass::Preferred);
    grid.fill_rect(TileCoord::new(4, 14), TileCoord::new(8, 16), TerrainClass::Discouraged);

    println!("{}", grid);
    println!(
        "Blocked tiles: {} / {}",
        grid.count(TerrainClass::Blocked),
        grid.width() * grid.height()
    );

    let bounds = grid.world_bounds();
    println!("World bounds: {:.1} x {:.1}", bounds.width, bounds.height);

    for p in [
        WorldPosition::new(8.0, 8.0),
        WorldPosition::new(160.0, 168.0),
        WorldPosition::new(330.0, 12.0),
    ] {
        match grid.tile_at(p) {
            Some(tile) => println!(
                "{} -> tile {} ({:?}, walkable: {})",
                p,
                tile,
                grid.terrain_class(tile),
                grid.is_walkable(p)
            ),
            None => println!("{} is outside the grid", p),
        }
    }
}
