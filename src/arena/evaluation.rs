//! Evaluation runs: several games against the engine, tallied per colour, and
//! sweeps of such matches over engine skill levels.

use crate::arena::game_loop::{play_game, GameSettings, ModelOutcome};
use crate::arena::model_player::ModelPlayer;
use crate::arena::ArenaError;
use crate::config::{EngineConfig, MatchConfig};
use crate::engine::ReferenceEngine;
use crate::game::position::Side;
use crate::recording::{GameRecord, GameSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which colour the model plays in each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorAssignment {
    White,
    Black,
    /// Alternate, white first
    Both,
}

impl ColorAssignment {
    /// Model side for the zero-based `round`.
    pub fn side_for_round(self, round: u32) -> Side {
        match self {
            ColorAssignment::White => Side::White,
            ColorAssignment::Black => Side::Black,
            ColorAssignment::Both if round % 2 == 0 => Side::White,
            ColorAssignment::Both => Side::Black,
        }
    }
}

impl FromStr for ColorAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "white" => Ok(ColorAssignment::White),
            "black" => Ok(ColorAssignment::Black),
            "both" => Ok(ColorAssignment::Both),
            other => Err(format!("unknown colour '{}', expected white, black or both", other)),
        }
    }
}

impl fmt::Display for ColorAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorAssignment::White => write!(f, "white"),
            ColorAssignment::Black => write!(f, "black"),
            ColorAssignment::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Tally {
    pub fn add(&mut self, outcome: ModelOutcome) {
        match outcome {
            ModelOutcome::Win => self.wins += 1,
            ModelOutcome::Loss => self.losses += 1,
            ModelOutcome::Draw => self.draws += 1,
        }
    }

    pub fn merge(&mut self, other: &Tally) {
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
    }

    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Wins over completed games, in percent. 0 when nothing was played.
    pub fn win_rate(&self) -> f64 {
        match self.games() {
            0 => 0.0,
            n => 100.0 * f64::from(self.wins) / f64::from(n),
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.wins, self.losses, self.draws)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchSummary {
    pub skill_level: u8,
    pub rounds: u32,
    pub failed_rounds: u32,
    pub total: Tally,
    pub as_white: Tally,
    pub as_black: Tally,
    #[serde(skip)]
    pub records: Vec<GameRecord>,
}

impl MatchSummary {
    pub fn new(skill_level: u8) -> Self {
        Self {
            skill_level,
            ..Self::default()
        }
    }

    pub fn record_outcome(&mut self, side: Side, outcome: ModelOutcome) {
        self.total.add(outcome);
        match side {
            Side::White => self.as_white.add(outcome),
            Side::Black => self.as_black.add(outcome),
        }
    }

    /// Folds another match at the same skill level into this one.
    pub fn merge(&mut self, other: MatchSummary) {
        self.rounds += other.rounds;
        self.failed_rounds += other.failed_rounds;
        self.total.merge(&other.total);
        self.as_white.merge(&other.as_white);
        self.as_black.merge(&other.as_black);
        self.records.extend(other.records);
    }

    pub fn win_rate(&self) -> f64 {
        self.total.win_rate()
    }
}

/// Plays `config.rounds` games at `engine_config.skill_level`.
///
/// A game that fails because of the oracle, the search or the engine is
/// logged and counted in `failed_rounds`; the match goes on. Failing to
/// store a record stops the match.
pub fn run_match(
    model: &mut ModelPlayer,
    engine: &mut dyn ReferenceEngine,
    config: &MatchConfig,
    engine_config: &EngineConfig,
    sink: &mut dyn GameSink,
) -> Result<MatchSummary, ArenaError> {
    engine.set_skill_level(engine_config.skill_level)?;
    let settings: GameSettings = config.game_settings(engine_config.limits());
    let mut summary = MatchSummary::new(engine_config.skill_level);

    log::info!(
        "Match: {} rounds vs {}, model plays {}, {} simulations, temperature {}",
        config.rounds,
        engine.name(),
        config.model_color,
        settings.simulations,
        settings.temperature
    );

    for round in 0..config.rounds {
        let side = config.model_color.side_for_round(round);
        summary.rounds += 1;

        let played = match play_game(model, engine, side, &settings) {
            Ok(played) => played,
            Err(e) if e.is_game_failure() => {
                log::warn!("Round {} failed ({}), continuing", round + 1, e);
                summary.failed_rounds += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        summary.record_outcome(side, played.outcome);
        let record = GameRecord::from_played(&played, round + 1, Some(engine_config.skill_level));
        sink.record_game(&record)?;
        summary.records.push(record);

        log::info!(
            "Round {:3}/{} | as {} | {} | W-L-D {} | win rate {:.1}%",
            round + 1,
            config.rounds,
            side,
            played.outcome,
            summary.total,
            summary.win_rate()
        );
    }

    Ok(summary)
}

/// Plays a match as white then as black at every level of `skill_levels`.
///
/// Returns one merged summary per level, in the given order.
pub fn run_skill_sweep(
    model: &mut ModelPlayer,
    engine: &mut dyn ReferenceEngine,
    config: &MatchConfig,
    engine_config: &EngineConfig,
    skill_levels: &[u8],
    sink: &mut dyn GameSink,
) -> Result<Vec<MatchSummary>, ArenaError> {
    let mut summaries = Vec::with_capacity(skill_levels.len());

    for &level in skill_levels {
        log::info!("=== Skill level {} ===", level);
        let level_config = EngineConfig {
            skill_level: level,
            ..engine_config.clone()
        };

        let mut summary = MatchSummary::new(level);
        for color in [ColorAssignment::White, ColorAssignment::Black] {
            let colour_config = MatchConfig {
                model_color: color,
                ..config.clone()
            };
            summary.merge(run_match(model, engine, &colour_config, &level_config, sink)?);
        }

        log::info!(
            "Skill level {}: W-L-D {} (white {}, black {}), win rate {:.2}%",
            level,
            summary.total,
            summary.as_white,
            summary.as_black,
            summary.win_rate()
        );
        summaries.push(summary);
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_assignment() {
        assert_eq!(ColorAssignment::White.side_for_round(3), Side::White);
        assert_eq!(ColorAssignment::Black.side_for_round(0), Side::Black);
        let both: Vec<Side> = (0..4).map(|r| ColorAssignment::Both.side_for_round(r)).collect();
        assert_eq!(both, vec![Side::White, Side::Black, Side::White, Side::Black]);
        assert_eq!("BOTH".parse::<ColorAssignment>(), Ok(ColorAssignment::Both));
        assert!("red".parse::<ColorAssignment>().is_err());
    }

    #[test]
    fn test_tally_and_merge() {
        let mut white = MatchSummary::new(3);
        white.rounds = 2;
        white.record_outcome(Side::White, ModelOutcome::Win);
        white.record_outcome(Side::White, ModelOutcome::Draw);

        let mut black = MatchSummary::new(3);
        black.rounds = 2;
        black.failed_rounds = 1;
        black.record_outcome(Side::Black, ModelOutcome::Loss);

        white.merge(black);
        assert_eq!(white.rounds, 4);
        assert_eq!(white.failed_rounds, 1);
        assert_eq!(white.total, Tally { wins: 1, losses: 1, draws: 1 });
        assert_eq!(white.as_black.losses, 1);
        assert!((white.win_rate() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(white.as_white.to_string(), "1-0-1");
    }

    #[test]
    fn test_empty_win_rate() {
        assert_eq!(Tally::default().win_rate(), 0.0);
    }
}
