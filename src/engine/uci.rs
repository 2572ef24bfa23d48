//! Stockfish as the reference engine.
//!
//! Process handling and the UCI exchange are left to the `stockfish` crate;
//! this module maps positions, limits and replies onto the arena's types.

use crate::engine::{EngineError, EngineLimits, ReferenceEngine};
use crate::game::position::Position;
use shakmaty::Move;
use std::path::Path;
use stockfish::Stockfish;

/// Maps the engine's best-move text onto a legal move of `position`.
///
/// `(none)`, `0000` and an empty reply mean the engine had nothing to play.
pub fn engine_move(position: &Position, text: &str) -> Result<Move, EngineError> {
    let text = text.trim();
    if matches!(text, "" | "(none)" | "0000") {
        return Err(EngineError::NoMove { fen: position.fen() });
    }
    position.parse_uci(text).map_err(|_| EngineError::IllegalMove {
        uci: text.to_string(),
        fen: position.fen(),
    })
}

/// A Stockfish process driven over UCI.
pub struct UciEngine {
    engine: Stockfish,
    label: String,
    skill_level: Option<u8>,
}

impl std::fmt::Debug for UciEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UciEngine")
            .field("label", &self.label)
            .field("skill_level", &self.skill_level)
            .finish_non_exhaustive()
    }
}

impl UciEngine {
    pub fn spawn(path: impl AsRef<Path>, skill_level: Option<u8>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let path_text = path
            .to_str()
            .ok_or_else(|| EngineError::Protocol(format!("engine path {} is not UTF-8", path.display())))?;

        let mut engine = Stockfish::new(path_text).map_err(|source| EngineError::Spawn {
            path: path.display().to_string(),
            source,
        })?;
        engine.setup_for_new_game()?;
        if let Some(level) = skill_level {
            engine.set_skill_level(level.into())?;
        }

        let label = "Stockfish".to_string();
        log::info!(
            "Engine ready: {} at {} (skill level {})",
            label,
            path.display(),
            skill_level.map_or("default".to_string(), |l| l.to_string())
        );

        Ok(Self {
            engine,
            label,
            skill_level,
        })
    }

    pub fn skill_level(&self) -> Option<u8> {
        self.skill_level
    }
}

impl ReferenceEngine for UciEngine {
    fn name(&self) -> String {
        match self.skill_level {
            Some(level) => format!("{} (Skill Level {})", self.label, level),
            None => self.label.clone(),
        }
    }

    fn set_skill_level(&mut self, level: u8) -> Result<(), EngineError> {
        if self.skill_level == Some(level) {
            return Ok(());
        }
        self.engine.set_skill_level(level.into())?;
        self.skill_level = Some(level);
        log::info!("Engine skill level set to {}", level);
        Ok(())
    }

    fn new_game(&mut self) -> Result<(), EngineError> {
        self.engine.setup_for_new_game()?;
        if let Some(level) = self.skill_level {
            self.engine.set_skill_level(level.into())?;
        }
        Ok(())
    }

    fn play(&mut self, position: &Position, limits: &EngineLimits) -> Result<Move, EngineError> {
        self.engine.set_fen_position(&position.fen())?;
        if let Some(depth) = limits.search_depth() {
            self.engine.set_depth(depth);
        }

        let output = match limits.move_time() {
            Some(time) => self.engine.go_for(time)?,
            None => self.engine.go()?,
        };
        let text = output.best_move();
        log::trace!("engine plays {}", text);
        engine_move(position, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::position::uci;
    use assert_matches::assert_matches;

    #[test]
    fn test_engine_move_is_mapped_to_legal_move() {
        let position = Position::starting();
        let mv = engine_move(&position, "e2e4\n").unwrap();
        assert_eq!(uci(&mv), "e2e4");

        let promotion = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        assert_eq!(uci(&engine_move(&promotion, "a7a8q").unwrap()), "a7a8q");
    }

    #[test]
    fn test_illegal_and_missing_moves() {
        let position = Position::starting();
        assert_matches!(engine_move(&position, "e2e5"), Err(EngineError::IllegalMove { .. }));
        assert_matches!(engine_move(&position, "(none)"), Err(EngineError::NoMove { .. }));
        assert_matches!(engine_move(&position, "0000"), Err(EngineError::NoMove { .. }));
        assert_matches!(engine_move(&position, ""), Err(EngineError::NoMove { .. }));
    }

    #[test]
    fn test_spawn_missing_binary() {
        let result = UciEngine::spawn("/nonexistent/stockfish-binary", Some(1));
        assert_matches!(result, Err(EngineError::Spawn { .. }));
    }
}
