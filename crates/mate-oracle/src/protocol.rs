//! UCI line-protocol parsing shared by the blocking and async clients.
//!
//! Requests are `position fen <FEN>` followed by `go depth <N>`. The reply
//! is zero or more `info … score …` lines (the last one wins) terminated by
//! a `bestmove` line. Anything else on the channel is engine chatter and is
//! skipped.

/// Forced-mate distance, normalized to the perspective of the analyzed
/// position: who ends up delivering mate, and in how many of their own
/// moves. Raw UCI `score mate ±N` is signed from the side to move; the
/// conversion happens here so callers never see the sign convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MateScore {
    /// The side to move in the analyzed position mates in N moves.
    Mover(u32),
    /// The side to move gets mated in N opposing moves. `Defender(0)`
    /// means the position is already checkmate.
    Defender(u32),
}

impl MateScore {
    /// Convert a raw signed UCI mate value.
    pub fn from_signed(raw: i32) -> MateScore {
        if raw > 0 {
            MateScore::Mover(raw as u32)
        } else {
            MateScore::Defender(raw.unsigned_abs())
        }
    }
}

/// Result of a single position analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Best move in UCI notation; `None` when the engine reported
    /// `bestmove (none)` (no legal moves).
    pub best_move: Option<String>,
    /// Forced-mate verdict, if the engine found one within its budget.
    pub mate: Option<MateScore>,
    /// Centipawn score when no mate was found.
    pub cp: Option<i32>,
}

impl Analysis {
    pub fn is_forced_mate(&self) -> bool {
        self.mate.is_some()
    }
}

/// Fold one response line into `analysis`. Returns `true` on the terminal
/// `bestmove` line. Malformed or unrelated lines are ignored.
pub fn accumulate(analysis: &mut Analysis, line: &str) -> bool {
    let line = line.trim();
    if line.starts_with("info") {
        if let Some(mate) = parse_mate(line) {
            analysis.mate = Some(MateScore::from_signed(mate));
            analysis.cp = None;
        } else if let Some(cp) = parse_cp(line) {
            analysis.cp = Some(cp);
            analysis.mate = None;
        }
        false
    } else if line.starts_with("bestmove") {
        analysis.best_move = parse_bestmove(line);
        true
    } else {
        false
    }
}

/// Parse `score mate <±N>` from an info line.
pub fn parse_mate(line: &str) -> Option<i32> {
    parse_after(line, "mate")
}

/// Parse `score cp <N>` from an info line.
pub fn parse_cp(line: &str) -> Option<i32> {
    parse_after(line, "cp")
}

fn parse_after(line: &str, keyword: &str) -> Option<i32> {
    let mut parts = line.split_whitespace();
    while let Some(part) = parts.next() {
        if part == keyword {
            return parts.next().and_then(|v| v.parse().ok());
        }
    }
    None
}

/// Parse the move out of a `bestmove` line; `(none)` means no legal move.
pub fn parse_bestmove(line: &str) -> Option<String> {
    let mv = line.split_whitespace().nth(1)?;
    if mv == "(none)" || mv == "0000" {
        None
    } else {
        Some(mv.to_string())
    }
}
