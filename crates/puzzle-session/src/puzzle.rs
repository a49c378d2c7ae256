//! Puzzle records and load-time validation.
//!
//! A `PuzzleRecord` is the storage shape (what the dataset pipeline
//! exports); a `Puzzle` is the validated form the session runs against.
//! Validation replays the entire canonical solution and rejects any record
//! that does not terminate in checkmate of the right side.

use serde::{Deserialize, Serialize};

use chess_core::{Color, Move, Position};

use crate::error::PuzzleError;

/// A puzzle as stored: id, starting FEN, space-separated UCI solution,
/// rating, tagged mate depth, theme tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub id: String,
    pub fen: String,
    /// Space-separated UCI moves, e.g. `"h5f7"` or `"d6d1 c1d1 e5g4 ..."`.
    pub moves: String,
    #[serde(default)]
    pub rating: u32,
    pub mate_in: u32,
    #[serde(default)]
    pub themes: Vec<String>,
}

/// A validated puzzle: parsed position, parsed solution, and the derived
/// leading-move convention.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub id: String,
    pub start: Position,
    pub solution: Vec<Move>,
    pub rating: u32,
    pub mate_in: u32,
    pub themes: Vec<String>,
    /// The side solving the puzzle.
    pub player_color: Color,
    /// True when the first solution move is the opponent's setup move.
    ///
    /// The canonical player-first form of a mate-in-N has `2N - 1`
    /// half-moves (player makes N moves, opponent N - 1 replies); any
    /// other length, notably the raw Lichess `2N` form, means the
    /// opponent's blunder leads.
    pub opponent_leads: bool,
}

impl Puzzle {
    pub fn from_record(record: &PuzzleRecord) -> Result<Puzzle, PuzzleError> {
        let invalid = |reason: String| PuzzleError::Invalid {
            id: record.id.clone(),
            reason,
        };

        if record.mate_in == 0 {
            return Err(invalid("mate depth must be at least 1".into()));
        }

        let start = Position::from_fen(&record.fen)?;

        let mut solution = Vec::new();
        for token in record.moves.split_whitespace() {
            let mv: Move = token
                .parse()
                .map_err(|e| invalid(format!("bad solution move '{token}': {e}")))?;
            solution.push(mv);
        }
        if solution.is_empty() {
            return Err(invalid("empty solution".into()));
        }

        let opponent_leads = solution.len() != 2 * record.mate_in as usize - 1;
        let player_color = if opponent_leads {
            start.side_to_move().opponent()
        } else {
            start.side_to_move()
        };

        // Replay the whole line; every move must be legal and the last one
        // must checkmate the opponent.
        let mut position = start.clone();
        for (i, mv) in solution.iter().enumerate() {
            position
                .play(mv)
                .map_err(|_| invalid(format!("solution move {} ({mv}) is illegal", i + 1)))?;
        }
        if !position.is_checkmate() {
            return Err(invalid("solution does not end in checkmate".into()));
        }
        if position.side_to_move() != player_color.opponent() {
            return Err(invalid("solution mates the wrong side".into()));
        }

        Ok(Puzzle {
            id: record.id.clone(),
            start,
            solution,
            rating: record.rating,
            mate_in: record.mate_in,
            themes: record.themes.clone(),
            player_color,
            opponent_leads,
        })
    }

    /// The canonical solution move at `index`, if the line reaches that far.
    pub fn canonical_move(&self, index: usize) -> Option<&Move> {
        self.solution.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, fen: &str, moves: &str, mate_in: u32) -> PuzzleRecord {
        PuzzleRecord {
            id: id.to_string(),
            fen: fen.to_string(),
            moves: moves.to_string(),
            rating: 1200,
            mate_in,
            themes: vec![format!("mateIn{mate_in}")],
        }
    }

    #[test]
    fn player_first_mate_in_one_loads() {
        // Scholar's mate delivery.
        let rec = record(
            "p1",
            "r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 0 1",
            "h5f7",
            1,
        );
        let puzzle = Puzzle::from_record(&rec).unwrap();
        assert!(!puzzle.opponent_leads);
        assert_eq!(puzzle.player_color, Color::White);
        assert_eq!(puzzle.solution.len(), 1);
    }

    #[test]
    fn solution_length_convention() {
        // 2N - 1 half-moves means the player moves first: king walk, forced
        // corner shuffle, rook mate.
        let player_first = record("p2", "k7/6R1/8/1K6/8/8/8/8 w - - 0 1", "b5b6 a8b8 g7g8", 2);
        let puzzle = Puzzle::from_record(&player_first).unwrap();
        assert!(!puzzle.opponent_leads);
        assert_eq!(puzzle.player_color, Color::White);

        // The same mate with the opponent's setup blunder prepended: 2N
        // half-moves, so the opponent leads and the solver is the side NOT
        // to move in the FEN.
        let opponent_first = record(
            "p3",
            "1k6/6R1/8/1K6/8/8/8/8 b - - 0 1",
            "b8a8 b5b6 a8b8 g7g8",
            2,
        );
        let puzzle = Puzzle::from_record(&opponent_first).unwrap();
        assert!(puzzle.opponent_leads);
        assert_eq!(puzzle.player_color, Color::White);
    }

    #[test]
    fn non_mating_solution_is_rejected_with_reason() {
        let rec = record(
            "bad1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "e2e4",
            1,
        );
        let err = Puzzle::from_record(&rec).unwrap_err();
        match err {
            PuzzleError::Invalid { id, reason } => {
                assert_eq!(id, "bad1");
                assert!(!reason.is_empty());
                assert!(reason.contains("checkmate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_ascii_solution_token_is_rejected_not_a_crash() {
        // A corrupt store must reject at load, never panic.
        let rec = record(
            "bad4",
            "r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 0 1",
            "h5é7",
            1,
        );
        let err = Puzzle::from_record(&rec).unwrap_err();
        assert!(matches!(err, PuzzleError::Invalid { .. }));
    }

    #[test]
    fn illegal_solution_move_is_rejected() {
        let rec = record(
            "bad2",
            "r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 0 1",
            "h5h8",
            1,
        );
        let err = Puzzle::from_record(&rec).unwrap_err();
        assert!(matches!(err, PuzzleError::Invalid { .. }));
    }

    #[test]
    fn malformed_fen_is_rejected() {
        let rec = record("bad3", "not a fen", "e2e4", 1);
        assert!(matches!(
            Puzzle::from_record(&rec),
            Err(PuzzleError::MalformedFen(_))
        ));
    }
}
