//! Game record data structures.
//!
//! A [`GameRecord`] is everything needed to write a finished game out again:
//! PGN tags, the move list and the result from the model's side.

use crate::arena::game_loop::{GameResult, ModelOutcome, PlayedGame, Termination};
use crate::game::position::Side;
use serde::{Deserialize, Serialize};

/// One half-move as it was played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedMove {
    pub uci: String,
    pub san: String,
}

/// Complete record of a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub event: String,
    pub site: String,
    /// PGN date, `YYYY.MM.DD`
    pub date: String,
    /// One-based round number within its match
    pub round: u32,
    pub white: String,
    pub black: String,
    pub result: GameResult,
    pub termination: Termination,
    pub model_side: Side,
    pub outcome: ModelOutcome,
    pub skill_level: Option<u8>,
    pub moves: Vec<RecordedMove>,
    pub final_fen: String,
    pub duration_ms: u64,
}

impl GameRecord {
    /// Builds the record of a finished game, dated today.
    pub fn from_played(game: &PlayedGame, round: u32, skill_level: Option<u8>) -> Self {
        let (white, black) = match game.model_side {
            Side::White => (game.model_name.clone(), game.engine_name.clone()),
            Side::Black => (game.engine_name.clone(), game.model_name.clone()),
        };

        Self {
            event: format!("{} vs {}", game.model_name, game.engine_name),
            site: "Evaluation".to_string(),
            date: chrono::Local::now().format("%Y.%m.%d").to_string(),
            round,
            white,
            black,
            result: game.result,
            termination: game.termination,
            model_side: game.model_side,
            outcome: game.outcome,
            skill_level,
            moves: game
                .moves
                .iter()
                .map(|m| RecordedMove {
                    uci: m.uci.clone(),
                    san: m.san.clone(),
                })
                .collect(),
            final_fen: game.final_fen.clone(),
            duration_ms: game.duration.as_millis() as u64,
        }
    }

    pub fn plies(&self) -> usize {
        self.moves.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::game_loop::PlayedMove;
    use std::time::Duration;

    fn played(model_side: Side) -> PlayedGame {
        PlayedGame {
            model_side,
            model_name: "Model".into(),
            engine_name: "Stockfish (Skill Level 3)".into(),
            moves: vec![PlayedMove {
                uci: "e2e4".into(),
                san: "e4".into(),
                by_model: model_side == Side::White,
            }],
            result: GameResult::Draw,
            termination: Termination::MoveCap,
            outcome: ModelOutcome::Draw,
            final_fen: "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1".into(),
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_players_follow_model_side() {
        let record = GameRecord::from_played(&played(Side::Black), 4, Some(3));
        assert_eq!(record.white, "Stockfish (Skill Level 3)");
        assert_eq!(record.black, "Model");
        assert_eq!(record.event, "Model vs Stockfish (Skill Level 3)");
        assert_eq!(record.round, 4);
        assert_eq!(record.plies(), 1);
        assert_eq!(record.duration_ms, 1500);
        assert_eq!(record.date.len(), 10);
    }
}
