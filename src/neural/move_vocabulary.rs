//! Global move vocabulary indexing the oracle's policy output.
//!
//! The policy head of the model emits one logit per vocabulary entry. Entries are
//! UCI strings, so the vocabulary is independent of any particular position.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

const FILES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];
const PROMOTION_SUFFIXES: [char; 4] = ['q', 'r', 'b', 'n'];

#[derive(Debug, thiserror::Error)]
pub enum VocabularyError {
    #[error("failed to read move vocabulary {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("move vocabulary is empty")]
    Empty,

    #[error("duplicate vocabulary entry '{0}'")]
    Duplicate(String),
}

#[derive(Debug, Clone)]
pub struct MoveVocabulary {
    entries: Vec<String>,
    index: HashMap<String, usize>,
}

fn square_name(square: usize) -> String {
    format!("{}{}", FILES[square % 8], square / 8 + 1)
}

fn is_queen_line(df: i32, dr: i32) -> bool {
    (df == 0 || dr == 0 || df.abs() == dr.abs()) && (df, dr) != (0, 0)
}

fn is_knight_jump(df: i32, dr: i32) -> bool {
    matches!((df.abs(), dr.abs()), (1, 2) | (2, 1))
}

impl MoveVocabulary {
    /// Every queen-line or knight displacement between two squares, followed by the
    /// promotion variants of pawn moves onto the last rank. Order is fixed:
    /// from-square major, to-square minor, then promotions.
    pub fn standard() -> Self {
        let mut entries = Vec::new();

        for from in 0..64usize {
            for to in 0..64usize {
                let df = (to % 8) as i32 - (from % 8) as i32;
                let dr = (to / 8) as i32 - (from / 8) as i32;
                if is_queen_line(df, dr) || is_knight_jump(df, dr) {
                    entries.push(format!("{}{}", square_name(from), square_name(to)));
                }
            }
        }

        // White pawns promote from rank 7 to 8, black pawns from rank 2 to 1.
        for (from_rank, to_rank) in [(6usize, 7usize), (1, 0)] {
            for file in 0..8usize {
                let from = from_rank * 8 + file;
                for to_file in file.saturating_sub(1)..=(file + 1).min(7) {
                    let to = to_rank * 8 + to_file;
                    for suffix in PROMOTION_SUFFIXES {
                        entries.push(format!("{}{}{}", square_name(from), square_name(to), suffix));
                    }
                }
            }
        }

        Self::from_entries(entries).unwrap_or_else(|_| unreachable!("standard vocabulary is unique"))
    }

    /// Builds a vocabulary from UCI strings, one per line. Blank lines and lines
    /// starting with `#` are skipped.
    pub fn from_uci_lines(text: &str) -> Result<Self, VocabularyError> {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self::from_entries(entries)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, VocabularyError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let vocabulary = Self::from_uci_lines(&text)?;
        log::info!(
            "Loaded move vocabulary with {} entries from {}",
            vocabulary.len(),
            path.display()
        );
        Ok(vocabulary)
    }

    fn from_entries(entries: Vec<String>) -> Result<Self, VocabularyError> {
        if entries.is_empty() {
            return Err(VocabularyError::Empty);
        }
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.clone(), i).is_some() {
                return Err(VocabularyError::Duplicate(entry.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index_of(&self, uci: &str) -> Option<usize> {
        self.index.get(uci).copied()
    }

    pub fn entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::position::{uci, Position};

    #[test]
    fn test_standard_covers_every_legal_move() {
        let vocabulary = MoveVocabulary::standard();
        let positions = [
            Position::starting(),
            Position::from_fen("r3k2r/pPppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap(),
            Position::from_fen("8/2P5/8/8/8/8/5p2/K6k b - - 0 1").unwrap(),
        ];

        for position in &positions {
            for mv in position.legal_moves() {
                assert!(
                    vocabulary.index_of(&uci(&mv)).is_some(),
                    "missing {}",
                    uci(&mv)
                );
            }
        }
    }

    #[test]
    fn test_standard_indices_are_stable() {
        let a = MoveVocabulary::standard();
        let b = MoveVocabulary::standard();
        assert_eq!(a.len(), b.len());
        assert_eq!(a.index_of("e2e4"), b.index_of("e2e4"));
        assert_eq!(a.entry(0), Some("a1b1"));
        assert!(a.index_of("e2e4").is_some());
        assert!(a.index_of("a1a1").is_none());
        assert!(a.index_of("a1c4").is_none());
    }

    #[test]
    fn test_from_uci_lines() {
        let vocabulary = MoveVocabulary::from_uci_lines("# opening moves\ne2e4\n\nd2d4\n").unwrap();
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(vocabulary.index_of("d2d4"), Some(1));
    }

    #[test]
    fn test_rejects_bad_vocabularies() {
        assert!(matches!(
            MoveVocabulary::from_uci_lines("\n#\n"),
            Err(VocabularyError::Empty)
        ));
        assert!(matches!(
            MoveVocabulary::from_uci_lines("e2e4\ne2e4"),
            Err(VocabularyError::Duplicate(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moves.txt");
        std::fs::write(&path, "g1f3\ne2e4\n").unwrap();
        let vocabulary = MoveVocabulary::load(&path).unwrap();
        assert_eq!(vocabulary.index_of("e2e4"), Some(1));

        assert!(matches!(
            MoveVocabulary::load(dir.path().join("missing.txt")),
            Err(VocabularyError::Io { .. })
        ));
    }
}
