use parking_lot::RwLock;
use std::{sync::Arc, time::Instant};

use tilenav_motion::{AgentId, Direction};
use tilenav_navigation::WorldPosition;

/// Last published view of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub position: WorldPosition,
    pub facing: Direction,
    pub moving: bool,
    pub target: Option<WorldPosition>,
}

#[derive(Debug, Clone)]
pub struct WorldState {
    pub frame: u64,
    pub agents: Vec<AgentView>,
    pub arrivals: u64,
    pub blocks: u64,
    pub rejections: u64,
    pub last_frame_ts: Instant,
    pub faults: Vec<String>,
}

impl Default for WorldState {
    fn default() -> Self {
        WorldState {
            frame: 0,
            agents: Vec::new(),
            arrivals: 0,
            blocks: 0,
            rejections: 0,
            last_frame_ts: Instant::now(),
            faults: Vec::new(),
        }
    }
}

pub type Blackboard = Arc<RwLock<WorldState>>;

pub fn snapshot(bb: &Blackboard) -> WorldState {
    (*bb.read()).clone()
}

/// Records a finished frame: agent views and this frame's signal counts.
pub fn publish_frame(bb: &Blackboard, frame: u64, agents: Vec<AgentView>, arrivals: u64, blocks: u64, rejections: u64) {
    let mut g = bb.write();
    g.frame = frame;
    g.agents = agents;
    g.arrivals += arrivals;
    g.blocks += blocks;
    g.rejections += rejections;
    g.last_frame_ts = Instant::now();
}

pub fn raise_fault(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if !g.faults.iter().any(|s| s == msg) {
        g.faults.push(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_frame_accumulates_counts() {
        let bb: Blackboard = Arc::default();
        let view = AgentView {
            id: AgentId(1),
            position: WorldPosition::new(16.0, 16.0),
            facing: Direction::Down,
            moving: false,
            target: None,
        };
        publish_frame(&bb, 1, vec![view.clone()], 1, 0, 2);
        publish_frame(&bb, 2, vec![view.clone()], 1, 1, 0);

        let state = snapshot(&bb);
        assert_eq!(state.frame, 2);
        assert_eq!(state.agents, vec![view]);
        assert_eq!((state.arrivals, state.blocks, state.rejections), (2, 1, 2));
    }

    #[test]
    fn test_faults_are_deduplicated() {
        let bb: Blackboard = Arc::default();
        raise_fault(&bb, "simulation stalled");
        raise_fault(&bb, "simulation stalled");
        raise_fault(&bb, "other");
        assert_eq!(snapshot(&bb).faults, vec!["simulation stalled", "other"]);
    }
}
