//! Session-layer error types.
//!
//! Everything here is local and recoverable: a rejected move, an invalid
//! puzzle, or a dead oracle all resolve to a reported outcome, never a
//! crash or an undefined board state.

use thiserror::Error;

use chess_core::{FenError, Move};

use crate::session::SessionState;

/// Puzzle load failures. A bad record is rejected wholesale; nothing leaks
/// into the session.
#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("malformed FEN: {0}")]
    MalformedFen(#[from] FenError),

    #[error("invalid puzzle {id}: {reason}")]
    Invalid { id: String, reason: String },
}

/// Puzzle store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read puzzle file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse puzzle file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no puzzle matches the filter")]
    NoMatch,
}

/// Misuse of the session API. Never mutates the session.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("operation not allowed in state {0:?}")]
    StateViolation(SessionState),

    #[error("oracle unavailable")]
    OracleUnavailable,

    #[error("opponent reply {0} is not legal here")]
    IllegalReply(Move),
}

/// Why a submitted player move was not accepted. A rejection reason, not a
/// fault: the position is untouched and the player may try again.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    #[error("illegal move")]
    IllegalMove,

    #[error("does not force mate")]
    NoForcedMate,

    #[error("mates in {found} but {required} was required")]
    SlowerMate { found: u32, required: u32 },

    #[error("oracle unavailable; only the canonical move is accepted")]
    OracleUnavailable,
}
