//! Game recording module.
//!
//! Finished games are stored through a [`GameSink`]; the usual sink writes one
//! PGN file per game. Reports aggregate whole evaluation runs.
//!
//! # Components
//!
//! - `game_record`: Data structures for game records
//! - `pgn`: PGN text, per-game files and combined files
//! - `report`: CSV rows, JSON summary and text report

pub mod game_record;
pub mod pgn;
pub mod report;

pub use game_record::{GameRecord, RecordedMove};
pub use pgn::{to_pgn, write_pgns, PgnDirectory};
pub use report::{write_games_csv, write_json_summary, write_text_report, EvaluationReport, LevelReport};

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Destination for finished games.
pub trait GameSink {
    fn record_game(&mut self, record: &GameRecord) -> Result<(), RecordError>;
}

/// Keeps records in memory.
impl GameSink for Vec<GameRecord> {
    fn record_game(&mut self, record: &GameRecord) -> Result<(), RecordError> {
        self.push(record.clone());
        Ok(())
    }
}
