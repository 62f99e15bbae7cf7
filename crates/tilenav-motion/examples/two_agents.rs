use std::time::{Duration, Instant};

use tilenav_motion::{
    AgentId, Direction, InputEvent, InputTranslator, MoveSignal, MovementConfig, MovementCoordinator,
};
use tilenav_navigation::{TileGrid, WorldPosition};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let grid = TileGrid::from_ascii(
        &[
            "..........",
            "....#.....",
            "....#..~~.",
            "....#..~~.",
            "..........",
        ],
        32.0,
    )
    .expect("map rows are valid");

    let mut coordinator = MovementCoordinator::new(grid, MovementConfig::default());
    let mut input = InputTranslator::default();
    let (alice, bob) = (AgentId(1), AgentId(2));
    coordinator
        .register_agent(alice, WorldPosition::new(16.0, 80.0))
        .expect("spawn tile is open");
    coordinator
        .register_agent(bob, WorldPosition::new(304.0, 144.0))
        .expect("spawn tile is open");

    let dt = 1.0 / 60.0;
    let start = Instant::now();

    println!("Initializing simulation...");
    println!("  Agents: {} at {}, {} at {}", alice, WorldPosition::new(16.0, 80.0), bob, WorldPosition::new(304.0, 144.0));
    println!("  Time Step: {:.4} s", dt);

    // Both head for the same spot on the far side of the wall.
    let meeting_point = WorldPosition::new(208.0, 80.0);
    for agent in [alice, bob] {
        let outcome = input.handle(
            &mut coordinator,
            InputEvent::Target {
                agent,
                position: meeting_point,
            },
            start,
        );
        println!("  {} -> {}: {:?}", agent, meeting_point, outcome);
    }

    println!("\nSimulating...");
    for frame in 1..=360 {
        let moving = coordinator.tick_all(dt);
        for event in coordinator.drain_events() {
            match event.signal {
                MoveSignal::Arrived { position } => println!("Frame {:>3}: {} arrived at {}", frame, event.agent, position),
                MoveSignal::Blocked { reason, position } => {
                    println!("Frame {:>3}: {} blocked at {} ({})", frame, event.agent, position, reason)
                }
                MoveSignal::Rejected { error } => println!("Frame {:>3}: {} rejected: {}", frame, event.agent, error),
            }
        }
        if moving == 0 {
            println!("All agents idle after {} frames.", frame);
            break;
        }
    }

    // A couple of key presses for bob, 200 ms apart so neither is debounced.
    for (i, direction) in [Direction::Up, Direction::Left].into_iter().enumerate() {
        let now = start + Duration::from_millis(200 * (i as u64 + 1));
        let outcome = input.handle(&mut coordinator, InputEvent::Step { agent: bob, direction }, now);
        println!("{} pressed {:?}: {:?}", bob, direction, outcome);
    }

    println!("\nFinal state:");
    for agent in coordinator.agents() {
        println!("  {} at {} facing {:?}", agent.id(), agent.position(), agent.facing());
    }
}
