use std::sync::Arc;
use tokio::sync::broadcast;

use tilenav_motion::{AgentId, InputEvent};
use tilenav_navigation::{TerrainClass, TileCoord, WorldPosition};

/// Requests for the simulation thread, applied between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Input(InputEvent),
    Teleport { agent: AgentId, position: WorldPosition },
    Cancel(AgentId),
    SetTerrain { tile: TileCoord, class: TerrainClass },
}

/// Broadcast topic with bounded capacity.
///
/// Messages are shared as `Arc<T>` so every subscriber sees the same
/// allocation; slow subscribers lag and lose the oldest messages.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes `msg`, returning how many subscribers will see it.
    pub fn publish(&self, msg: T) -> usize {
        self.tx.send(Arc::new(msg)).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }
}
