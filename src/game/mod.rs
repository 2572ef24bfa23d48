pub mod position;

pub use position::{GameStatus, Position, PositionError, Side};
