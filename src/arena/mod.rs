pub mod evaluation;
pub mod game_loop;
pub mod model_player;

use crate::engine::EngineError;
use crate::game::position::PositionError;
use crate::mcts::algorithm::SearchError;
use crate::recording::RecordError;

pub use evaluation::{run_match, run_skill_sweep, ColorAssignment, MatchSummary, Tally};
pub use game_loop::{play_game, GameResult, GameSettings, ModelOutcome, PlayedGame, PlayedMove, Termination};
pub use model_player::ModelPlayer;

#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("model search failed: {0}")]
    Search(#[from] SearchError),

    #[error("reference engine failed: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("cannot store game record: {0}")]
    Record(#[from] RecordError),
}

impl ArenaError {
    /// Failures that end one game but not the whole run.
    pub fn is_game_failure(&self) -> bool {
        !matches!(self, ArenaError::Record(_))
    }
}
