//! One game between the model and the reference engine.

use crate::arena::model_player::ModelPlayer;
use crate::arena::ArenaError;
use crate::engine::{EngineError, EngineLimits, ReferenceEngine};
use crate::game::position::{uci, GameStatus, Position, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Positions repeated this many times end the game as a draw.
pub const REPETITION_LIMIT: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    /// Plies after which the game is adjudicated a draw
    pub max_plies: u32,
    pub engine_limits: EngineLimits,
    pub temperature: f64,
    pub simulations: u32,
    /// Keep the model's search tree between its moves
    pub reuse_tree: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            max_plies: 200,
            engine_limits: EngineLimits::default(),
            temperature: 0.2,
            simulations: 800,
            reuse_tree: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    /// PGN result token.
    pub fn as_pgn(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }

    pub fn for_side(self, side: Side) -> ModelOutcome {
        match (self, side) {
            (GameResult::Draw, _) => ModelOutcome::Draw,
            (GameResult::WhiteWins, Side::White) | (GameResult::BlackWins, Side::Black) => ModelOutcome::Win,
            _ => ModelOutcome::Loss,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_pgn())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
    /// Ply cap reached, adjudicated as a draw
    MoveCap,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::InsufficientMaterial => "insufficient material",
            Termination::FiftyMoveRule => "fifty-move rule",
            Termination::ThreefoldRepetition => "threefold repetition",
            Termination::MoveCap => "move cap",
        };
        f.write_str(text)
    }
}

/// Result from the model's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelOutcome {
    Win,
    Loss,
    Draw,
}

impl fmt::Display for ModelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelOutcome::Win => write!(f, "win"),
            ModelOutcome::Loss => write!(f, "loss"),
            ModelOutcome::Draw => write!(f, "draw"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayedMove {
    pub uci: String,
    pub san: String,
    pub by_model: bool,
}

#[derive(Debug, Clone)]
pub struct PlayedGame {
    pub model_side: Side,
    pub model_name: String,
    pub engine_name: String,
    pub moves: Vec<PlayedMove>,
    pub result: GameResult,
    pub termination: Termination,
    pub outcome: ModelOutcome,
    pub final_fen: String,
    pub duration: Duration,
}

/// Why `position` ends the game, if it does.
///
/// `repetitions` is how often the position has occurred so far.
pub fn termination_of(position: &Position, repetitions: u32) -> Option<(Termination, GameResult)> {
    match position.status() {
        GameStatus::Checkmate { winner: Side::White } => Some((Termination::Checkmate, GameResult::WhiteWins)),
        GameStatus::Checkmate { winner: Side::Black } => Some((Termination::Checkmate, GameResult::BlackWins)),
        GameStatus::Stalemate => Some((Termination::Stalemate, GameResult::Draw)),
        GameStatus::InsufficientMaterial => Some((Termination::InsufficientMaterial, GameResult::Draw)),
        GameStatus::FiftyMoveRule => Some((Termination::FiftyMoveRule, GameResult::Draw)),
        GameStatus::Ongoing if repetitions >= REPETITION_LIMIT => {
            Some((Termination::ThreefoldRepetition, GameResult::Draw))
        }
        GameStatus::Ongoing => None,
    }
}

/// Plays one game from the initial position, the model taking `model_side`.
///
/// Any search or engine failure aborts the game and is returned as an error.
pub fn play_game(
    model: &mut ModelPlayer,
    engine: &mut dyn ReferenceEngine,
    model_side: Side,
    settings: &GameSettings,
) -> Result<PlayedGame, ArenaError> {
    let start = Instant::now();
    model.new_game();
    engine.new_game()?;

    let mut position = Position::starting();
    let mut seen: HashMap<String, u32> = HashMap::new();
    seen.insert(position.repetition_key(), 1);
    let mut moves: Vec<PlayedMove> = Vec::new();

    let (termination, result) = loop {
        let repetitions = seen.get(&position.repetition_key()).copied().unwrap_or(0);
        if let Some(end) = termination_of(&position, repetitions) {
            break end;
        }
        if moves.len() as u32 >= settings.max_plies {
            break (Termination::MoveCap, GameResult::Draw);
        }

        let by_model = position.side_to_move() == model_side;
        let mv = if by_model {
            model
                .choose_move(&position, settings.simulations, settings.temperature, settings.reuse_tree)?
                .best_move
        } else {
            let mv = engine.play(&position, &settings.engine_limits)?;
            if !position.legal_moves().contains(&mv) {
                return Err(EngineError::IllegalMove {
                    uci: uci(&mv),
                    fen: position.fen(),
                }
                .into());
            }
            mv
        };

        let san = position.san(&mv);
        log::trace!("{} plays {}", if by_model { model.name() } else { "engine" }, san);
        position = position.play(&mv)?;
        model.observe_move(&mv);
        moves.push(PlayedMove {
            uci: uci(&mv),
            san,
            by_model,
        });
        *seen.entry(position.repetition_key()).or_insert(0) += 1;
    };

    let outcome = result.for_side(model_side);
    log::info!(
        "Game over after {} plies: {} ({}), model as {} {}",
        moves.len(),
        result,
        termination,
        model_side,
        outcome
    );

    Ok(PlayedGame {
        model_side,
        model_name: model.name().to_string(),
        engine_name: engine.name(),
        moves,
        result,
        termination,
        outcome,
        final_fen: position.fen(),
        duration: start.elapsed(),
    })
}
