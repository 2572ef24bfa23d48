//! PGN output.

use crate::arena::game_loop::GameResult;
use crate::recording::game_record::GameRecord;
use crate::recording::{GameSink, RecordError};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Movetext lines are wrapped before this many characters.
const LINE_WIDTH: usize = 80;

fn escape_tag(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// PGN text of one game: tag pairs, a blank line, then the movetext.
pub fn to_pgn(record: &GameRecord) -> String {
    let mut out = String::new();
    let tags = [
        ("Event", record.event.clone()),
        ("Site", record.site.clone()),
        ("Date", record.date.clone()),
        ("Round", record.round.to_string()),
        ("White", record.white.clone()),
        ("Black", record.black.clone()),
        ("Result", record.result.as_pgn().to_string()),
        ("Termination", record.termination.to_string()),
    ];
    for (name, value) in tags {
        let _ = writeln!(out, "[{} \"{}\"]", name, escape_tag(&value));
    }
    out.push('\n');

    let mut tokens: Vec<String> = Vec::with_capacity(record.moves.len() * 3 / 2 + 1);
    for (ply, mv) in record.moves.iter().enumerate() {
        if ply % 2 == 0 {
            tokens.push(format!("{}.", ply / 2 + 1));
        }
        tokens.push(mv.san.clone());
    }
    tokens.push(record.result.as_pgn().to_string());

    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + 1 + token.len() > LINE_WIDTH {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}

/// `game_<round>_<colour>_<result>.pgn`, with `draw` standing in for `1/2-1/2`.
pub fn game_file_name(record: &GameRecord) -> String {
    let result = match record.result {
        GameResult::Draw => "draw",
        decisive => decisive.as_pgn(),
    };
    format!("game_{}_{}_{}.pgn", record.round, record.model_side, result)
}

/// Writes several games into one PGN file, separated by blank lines.
pub fn write_pgns(path: impl AsRef<Path>, records: &[GameRecord]) -> Result<(), RecordError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        writer.write_all(to_pgn(record).as_bytes())?;
    }
    writer.flush()?;

    log::info!("Saved {} games to {}", records.len(), path.display());
    Ok(())
}

/// Sink writing one PGN file per game.
///
/// With `split_by_skill`, games go to `skill_<level>/` under the base directory.
pub struct PgnDirectory {
    base_dir: PathBuf,
    split_by_skill: bool,
}

impl PgnDirectory {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            split_by_skill: false,
        }
    }

    pub fn split_by_skill(mut self, split: bool) -> Self {
        self.split_by_skill = split;
        self
    }

    pub fn directory_for(&self, record: &GameRecord) -> PathBuf {
        match (self.split_by_skill, record.skill_level) {
            (true, Some(level)) => self.base_dir.join(format!("skill_{}", level)),
            _ => self.base_dir.clone(),
        }
    }
}

impl GameSink for PgnDirectory {
    fn record_game(&mut self, record: &GameRecord) -> Result<(), RecordError> {
        let dir = self.directory_for(record);
        fs::create_dir_all(&dir)?;
        let path = dir.join(game_file_name(record));
        fs::write(&path, to_pgn(record))?;
        log::debug!("Game saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::game_loop::{ModelOutcome, Termination};
    use crate::game::position::Side;
    use crate::recording::game_record::RecordedMove;

    fn record(sans: &[&str], result: GameResult, outcome: ModelOutcome) -> GameRecord {
        GameRecord {
            event: "Model vs Stockfish (Skill Level 1)".into(),
            site: "Evaluation".into(),
            date: "2026.10.18".into(),
            round: 2,
            white: "Model".into(),
            black: "Stockfish (Skill Level 1)".into(),
            result,
            termination: Termination::Checkmate,
            model_side: Side::White,
            outcome,
            skill_level: Some(1),
            moves: sans
                .iter()
                .map(|s| RecordedMove {
                    uci: String::new(),
                    san: s.to_string(),
                })
                .collect(),
            final_fen: String::new(),
            duration_ms: 0,
        }
    }

    #[test]
    fn test_to_pgn() {
        let game = record(&["f3", "e5", "g4", "Qh4#"], GameResult::BlackWins, ModelOutcome::Loss);
        let pgn = to_pgn(&game);

        assert!(pgn.starts_with("[Event \"Model vs Stockfish (Skill Level 1)\"]\n[Site \"Evaluation\"]\n"));
        assert!(pgn.contains("[Round \"2\"]\n"));
        assert!(pgn.contains("[Result \"0-1\"]\n"));
        assert!(pgn.contains("[Termination \"checkmate\"]\n\n"));
        assert!(pgn.ends_with("1. f3 e5 2. g4 Qh4# 0-1\n"));
    }

    #[test]
    fn test_movetext_wraps() {
        let sans: Vec<&str> = std::iter::repeat(["Nf3", "Nf6", "Ng1", "Ng8"]).take(20).flatten().collect();
        let pgn = to_pgn(&record(&sans, GameResult::Draw, ModelOutcome::Draw));
        let movetext = pgn.split("\n\n").nth(1).unwrap();
        assert!(movetext.lines().count() > 1);
        assert!(movetext.lines().all(|line| line.len() <= LINE_WIDTH));
        assert!(movetext.trim_end().ends_with("1/2-1/2"));
    }

    #[test]
    fn test_file_names() {
        let win = record(&[], GameResult::WhiteWins, ModelOutcome::Win);
        assert_eq!(game_file_name(&win), "game_2_white_1-0.pgn");
        let draw = record(&[], GameResult::Draw, ModelOutcome::Draw);
        assert_eq!(game_file_name(&draw), "game_2_white_draw.pgn");
    }

    #[test]
    fn test_directory_sink_and_combined_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = PgnDirectory::new(dir.path()).split_by_skill(true);
        let game = record(&["e4"], GameResult::WhiteWins, ModelOutcome::Win);
        sink.record_game(&game).unwrap();

        let path = dir.path().join("skill_1").join("game_2_white_1-0.pgn");
        assert!(path.exists());

        let combined = dir.path().join("skill_1_games.pgn");
        write_pgns(&combined, &[game.clone(), game]).unwrap();
        let text = std::fs::read_to_string(combined).unwrap();
        assert_eq!(text.matches("[Event ").count(), 2);
    }
}
