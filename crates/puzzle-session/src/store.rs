//! Puzzle store collaborator: hand the session a record matching a filter.
//!
//! Selection policy (daily rotation, rating ladders, dedup) lives with the
//! caller; this is just retrieval.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::puzzle::PuzzleRecord;

/// Which puzzles qualify. All fields optional; `None` matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PuzzleFilter {
    pub mate_in: Option<u32>,
    pub min_rating: Option<u32>,
    pub max_rating: Option<u32>,
    pub theme: Option<String>,
}

impl PuzzleFilter {
    pub fn matches(&self, record: &PuzzleRecord) -> bool {
        if let Some(mate_in) = self.mate_in {
            if record.mate_in != mate_in {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if record.rating < min {
                return false;
            }
        }
        if let Some(max) = self.max_rating {
            if record.rating > max {
                return false;
            }
        }
        if let Some(theme) = &self.theme {
            if !record.themes.iter().any(|t| t == theme) {
                return false;
            }
        }
        true
    }
}

/// Retrieval seam consumed by the game-mode layers.
pub trait PuzzleStore {
    fn get_puzzle(&self, filter: &PuzzleFilter) -> Result<PuzzleRecord, StoreError>;
}

/// A puzzle file: a JSON array of records, as exported by the dataset
/// pipeline.
pub struct JsonPuzzleStore {
    records: Vec<PuzzleRecord>,
}

impl JsonPuzzleStore {
    pub fn from_path(path: impl AsRef<Path>) -> Result<JsonPuzzleStore, StoreError> {
        let text = fs::read_to_string(path)?;
        let records: Vec<PuzzleRecord> = serde_json::from_str(&text)?;
        Ok(JsonPuzzleStore { records })
    }

    pub fn from_records(records: Vec<PuzzleRecord>) -> JsonPuzzleStore {
        JsonPuzzleStore { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PuzzleStore for JsonPuzzleStore {
    /// First matching record in file order.
    fn get_puzzle(&self, filter: &PuzzleFilter) -> Result<PuzzleRecord, StoreError> {
        self.records
            .iter()
            .find(|r| filter.matches(r))
            .cloned()
            .ok_or(StoreError::NoMatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<PuzzleRecord> {
        serde_json::from_str(
            r#"[
                {"id": "a", "fen": "x", "moves": "e2e4", "rating": 900,
                 "mate_in": 1, "themes": ["mateIn1", "backRankMate"]},
                {"id": "b", "fen": "x", "moves": "e2e4", "rating": 1500,
                 "mate_in": 2, "themes": ["mateIn2"]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn filter_by_depth_and_rating() {
        let store = JsonPuzzleStore::from_records(records());
        let filter = PuzzleFilter {
            mate_in: Some(2),
            ..Default::default()
        };
        assert_eq!(store.get_puzzle(&filter).unwrap().id, "b");

        let filter = PuzzleFilter {
            max_rating: Some(1000),
            ..Default::default()
        };
        assert_eq!(store.get_puzzle(&filter).unwrap().id, "a");
    }

    #[test]
    fn filter_by_theme() {
        let store = JsonPuzzleStore::from_records(records());
        let filter = PuzzleFilter {
            theme: Some("backRankMate".to_string()),
            ..Default::default()
        };
        assert_eq!(store.get_puzzle(&filter).unwrap().id, "a");
    }

    #[test]
    fn no_match_is_reported() {
        let store = JsonPuzzleStore::from_records(records());
        let filter = PuzzleFilter {
            mate_in: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            store.get_puzzle(&filter),
            Err(StoreError::NoMatch)
        ));
    }

    #[test]
    fn optional_record_fields_default() {
        let records: Vec<PuzzleRecord> =
            serde_json::from_str(r#"[{"id": "c", "fen": "x", "moves": "a1a2", "mate_in": 1}]"#)
                .unwrap();
        assert_eq!(records[0].rating, 0);
        assert!(records[0].themes.is_empty());
    }
}
