//! Reference engine boundary.
//!
//! The arena only needs "given a position and limits, give me a legal move".
//! [`UciEngine`] provides that for Stockfish through the `stockfish` crate.

pub mod uci;

use crate::game::position::Position;
use serde::{Deserialize, Serialize};
use shakmaty::Move;
use std::time::Duration;

pub use uci::{engine_move, UciEngine};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot start engine {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("engine protocol error: {0}")]
    Protocol(String),

    #[error("engine returned no move for {fen}")]
    NoMove { fen: String },

    #[error("engine played {uci}, which is illegal in {fen}")]
    IllegalMove { uci: String, fen: String },
}

/// Per-move search limits handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLimits {
    pub time_limit_ms: Option<u64>,
    pub depth: Option<u32>,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            time_limit_ms: Some(100),
            depth: Some(5),
        }
    }
}

impl EngineLimits {
    /// Depth for the engine's search. Without any limit the engine is held to depth 1.
    pub fn search_depth(&self) -> Option<u32> {
        match (self.depth, self.time_limit_ms) {
            (Some(depth), _) => Some(depth),
            (None, None) => Some(1),
            (None, Some(_)) => None,
        }
    }

    pub fn move_time(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Opponent the model is measured against.
pub trait ReferenceEngine {
    /// Display name, used in game records.
    fn name(&self) -> String;

    /// Sets the engine's difficulty, the only engine option the arena touches.
    fn set_skill_level(&mut self, level: u8) -> Result<(), EngineError>;

    /// Resets engine state between games.
    fn new_game(&mut self) -> Result<(), EngineError>;

    /// Best move for the side to move in `position`. The move must be legal.
    fn play(&mut self, position: &Position, limits: &EngineLimits) -> Result<Move, EngineError>;
}

impl<T: ReferenceEngine + ?Sized> ReferenceEngine for Box<T> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn set_skill_level(&mut self, level: u8) -> Result<(), EngineError> {
        (**self).set_skill_level(level)
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        (**self).new_game()
    }

    fn play(&mut self, position: &Position, limits: &EngineLimits) -> Result<Move, EngineError> {
        (**self).play(position, limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits() {
        let defaults = EngineLimits::default();
        assert_eq!(defaults.search_depth(), Some(5));
        assert_eq!(defaults.move_time(), Some(Duration::from_millis(100)));

        let time_only = EngineLimits {
            time_limit_ms: Some(250),
            depth: None,
        };
        assert_eq!(time_only.search_depth(), None);
        assert_eq!(time_only.move_time(), Some(Duration::from_millis(250)));

        let unlimited = EngineLimits {
            time_limit_ms: None,
            depth: None,
        };
        assert_eq!(unlimited.search_depth(), Some(1));
        assert_eq!(unlimited.move_time(), None);
    }
}
