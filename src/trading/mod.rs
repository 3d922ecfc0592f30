pub mod position;

pub use position::{ExecutionPrice, Position, PositionState};
