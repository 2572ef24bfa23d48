//! Chess position wrapper used by the search tree and the game loop.
//!
//! Rules (move generation, legality, SAN/UCI) come from `shakmaty`. This type adds
//! the explicit [`Side`] enum, the terminal-state classification the search needs
//! and the text keys used for repetition tracking and record keeping.

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, CastlingSide, Chess, Color, EnPassantMode, Move, Position as _, Role, Square};
use std::fmt;

/// Halfmove clock value at which the fifty-move rule ends the game.
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

/// Whether the game continues from a position, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: Side },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        self != GameStatus::Ongoing
    }

    /// Game-theoretic value for `side`: win 1.0, draw 0.5, loss 0.0.
    /// `None` while the game is still running.
    pub fn value_for(self, side: Side) -> Option<f32> {
        match self {
            GameStatus::Ongoing => None,
            GameStatus::Checkmate { winner } if winner == side => Some(1.0),
            GameStatus::Checkmate { .. } => Some(0.0),
            GameStatus::Stalemate
            | GameStatus::InsufficientMaterial
            | GameStatus::FiftyMoveRule => Some(0.5),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("illegal move {uci} in position {fen}")]
    IllegalMove { uci: String, fen: String },
}

/// An immutable chess position. Applying a move returns a new position.
#[derive(Debug, Clone)]
pub struct Position {
    chess: Chess,
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl Position {
    /// Standard initial board, white to move, all castling rights.
    pub fn starting() -> Self {
        Self {
            chess: Chess::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let invalid = |reason: String| PositionError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
        let chess: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(format!("{e}")))?;
        Ok(Self { chess })
    }

    pub fn side_to_move(&self) -> Side {
        self.chess.turn().into()
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.chess.legal_moves().into_iter().collect()
    }

    /// Plays `mv` on a copy of this position.
    pub fn play(&self, mv: &Move) -> Result<Position, PositionError> {
        match self.chess.clone().play(mv) {
            Ok(chess) => Ok(Self { chess }),
            Err(_) => Err(PositionError::IllegalMove {
                uci: uci(mv),
                fen: self.fen(),
            }),
        }
    }

    pub fn status(&self) -> GameStatus {
        if self.chess.legal_moves().is_empty() {
            if self.chess.is_check() {
                GameStatus::Checkmate {
                    winner: self.side_to_move().opposite(),
                }
            } else {
                GameStatus::Stalemate
            }
        } else if self.chess.is_insufficient_material() {
            GameStatus::InsufficientMaterial
        } else if self.chess.halfmoves() >= FIFTY_MOVE_HALFMOVES {
            GameStatus::FiftyMoveRule
        } else {
            GameStatus::Ongoing
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Piece on square `index` (a1 = 0, h1 = 7, a8 = 56, h8 = 63).
    pub fn piece_at(&self, index: u32) -> Option<(Side, Role)> {
        self.chess
            .board()
            .piece_at(Square::new(index))
            .map(|piece| (piece.color.into(), piece.role))
    }

    pub fn can_castle(&self, side: Side, castling: CastlingSide) -> bool {
        self.chess.castles().has(side.into(), castling)
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.chess.halfmoves()
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.chess.clone(), EnPassantMode::Legal).to_string()
    }

    /// FEN without the move counters: identical for positions that count as
    /// repetitions of each other.
    pub fn repetition_key(&self) -> String {
        self.fen()
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// SAN (with check/mate suffix) of a legal move from this position.
    pub fn san(&self, mv: &Move) -> String {
        SanPlus::from_move(self.chess.clone(), mv).to_string()
    }

    /// Finds the legal move whose UCI text is `text`.
    pub fn parse_uci(&self, text: &str) -> Result<Move, PositionError> {
        let wanted = text.trim();
        self.legal_moves()
            .into_iter()
            .find(|mv| uci(mv) == wanted)
            .ok_or_else(|| PositionError::IllegalMove {
                uci: wanted.to_string(),
                fen: self.fen(),
            })
    }
}

/// UCI text of a move (`e2e4`, `e7e8q`, castling as king move `e1g1`).
pub fn uci(mv: &Move) -> String {
    mv.to_uci(CastlingMode::Standard).to_string()
}
