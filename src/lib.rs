//! # Chess Arena
//!
//! Move selection for a chess model driven by Monte Carlo Tree Search, and the
//! harness that measures it against a UCI reference engine.
//!
//! ## Features
//!
//! - **Game**: legal moves and outcomes through `shakmaty`
//! - **Search**: PUCT tree search guided by a policy/value oracle
//! - **Neural**: move vocabulary, board encoding and (feature `torch`) the transformer oracle
//! - **Engine**: UCI engine process adapter
//! - **Arena**: games, matches and skill sweeps
//! - **Recording**: PGN files, CSV rows and evaluation reports
//!
//! ## Usage
//!
//! ```rust
//! use chess_arena::{game::Position, mcts::{select_move, MctsConfig}, neural::UniformOracle};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let oracle = UniformOracle::default();
//! let mut rng = StdRng::seed_from_u64(7);
//! let mv = select_move(&Position::starting(), &oracle, 32, 0.0, &MctsConfig::default(), &mut rng).unwrap();
//! println!("{}", chess_arena::game::position::uci(&mv));
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Games against the reference engine
pub mod arena;

/// Run configuration
pub mod config;

/// Reference engine adapter
pub mod engine;

/// Chess rules adapter
pub mod game;

/// Logger setup
pub mod logging;

/// Monte Carlo Tree Search
pub mod mcts;

/// Oracle boundary and neural network components
pub mod neural;

/// Game records and reports
pub mod recording;

// ============================================================================
// ERROR TYPES
// ============================================================================

use crate::arena::ArenaError;
use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::game::PositionError;
use crate::mcts::SearchError;
use crate::neural::move_vocabulary::VocabularyError;
use crate::neural::OracleError;
use crate::recording::RecordError;

/// Main error type for the library
#[derive(Debug, thiserror::Error)]
pub enum ChessArenaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] VocabularyError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Arena error: {0}")]
    Arena(#[from] ArenaError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Position error: {0}")]
    Position(#[from] PositionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ChessArenaError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
