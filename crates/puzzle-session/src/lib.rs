//! Forced-mate puzzle sessions on top of `chess-core` and `mate-oracle`.
//!
//! The crate validates puzzle records against the rules engine, drives
//! single-puzzle attempts through an explicit state machine, and settles
//! off-book moves with a UCI oracle without ever blocking on it.

pub mod error;
pub mod puzzle;
pub mod session;
pub mod store;

pub use error::{PuzzleError, RejectReason, SessionError, StoreError};
pub use puzzle::{Puzzle, PuzzleRecord};
pub use session::{
    OpponentPlan, PendingValidation, PuzzleSession, SessionEvent, SessionState, SubmitStep,
};
pub use store::{JsonPuzzleStore, PuzzleFilter, PuzzleStore};
