//! Evaluation reports: per-game CSV, JSON summary and the plain-text report.

use crate::arena::evaluation::{MatchSummary, Tally};
use crate::recording::game_record::GameRecord;
use crate::recording::RecordError;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Results at one skill level, as written to the JSON summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelReport {
    pub skill_level: u8,
    pub games: u32,
    pub failed_rounds: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
    pub white_results: Tally,
    pub black_results: Tally,
}

impl From<&MatchSummary> for LevelReport {
    fn from(summary: &MatchSummary) -> Self {
        Self {
            skill_level: summary.skill_level,
            games: summary.total.games(),
            failed_rounds: summary.failed_rounds,
            wins: summary.total.wins,
            losses: summary.total.losses,
            draws: summary.total.draws,
            win_rate: summary.win_rate(),
            white_results: summary.as_white,
            black_results: summary.as_black,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub model: String,
    pub engine: String,
    pub date: String,
    pub levels: Vec<LevelReport>,
}

impl EvaluationReport {
    pub fn new(model: impl Into<String>, engine: impl Into<String>, summaries: &[MatchSummary]) -> Self {
        Self {
            model: model.into(),
            engine: engine.into(),
            date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            levels: summaries.iter().map(LevelReport::from).collect(),
        }
    }

    /// Plain-text rendering, one block per skill level.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        text.push_str("Chess Transformer Model Evaluation Report\n");
        text.push_str("=======================================\n\n");
        text.push_str(&format!("Model: {}\n", self.model));
        text.push_str(&format!("Engine: {}\n", self.engine));
        text.push_str(&format!("Date: {}\n\n", self.date));
        text.push_str("Results by Stockfish Skill Level:\n");

        for level in &self.levels {
            text.push_str(&format!("\nSkill Level {}:\n", level.skill_level));
            text.push_str(&format!("  Total Games: {}\n", level.games));
            text.push_str(&format!(
                "  Wins: {}, Losses: {}, Draws: {}\n",
                level.wins, level.losses, level.draws
            ));
            text.push_str(&format!("  Win Rate: {:.2}%\n", level.win_rate));
            text.push_str(&format!("  As White: {}\n", level.white_results));
            text.push_str(&format!("  As Black: {}\n", level.black_results));
            if level.failed_rounds > 0 {
                text.push_str(&format!("  Failed Rounds: {}\n", level.failed_rounds));
            }
        }
        text
    }
}

pub fn write_text_report(path: impl AsRef<Path>, report: &EvaluationReport) -> Result<(), RecordError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, report.to_text())?;
    log::info!("Evaluation report saved to {}", path.display());
    Ok(())
}

pub fn write_json_summary(path: impl AsRef<Path>, report: &EvaluationReport) -> Result<(), RecordError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.flush()?;
    Ok(())
}

/// One CSV row per game.
pub fn write_games_csv(path: impl AsRef<Path>, records: &[GameRecord]) -> Result<(), RecordError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "skill_level",
        "round",
        "model_color",
        "result",
        "outcome",
        "termination",
        "plies",
        "duration_ms",
        "final_fen",
    ])?;

    for record in records {
        writer.write_record(&[
            record.skill_level.map(|l| l.to_string()).unwrap_or_default(),
            record.round.to_string(),
            record.model_side.to_string(),
            record.result.as_pgn().to_string(),
            record.outcome.to_string(),
            record.termination.to_string(),
            record.plies().to_string(),
            record.duration_ms.to_string(),
            record.final_fen.clone(),
        ])?;
    }

    writer.flush()?;
    log::info!("Saved {} game rows to {}", records.len(), path.display());
    Ok(())
}
