#![warn(missing_docs)]
#![doc = "Agent movement on tile grids."]
#![doc = ""]
#![doc = "This crate provides the [`MovementCoordinator`], which moves agents along smoothed"]
#![doc = "A* paths with collision validation and facing, and the [`InputTranslator`], which"]
#![doc = "turns player input into coordinator requests."]

pub mod agent;
pub mod coordinator;
pub mod error;
pub mod input;

pub use agent::{Agent, AgentId, Direction, MovementSnapshot};
pub use coordinator::{MoveSignal, MovementConfig, MovementCoordinator, MovementEvent, TickOutcome};
pub use error::{BlockReason, MoveError};
pub use input::{InputConfig, InputEvent, InputOutcome, InputTranslator};
