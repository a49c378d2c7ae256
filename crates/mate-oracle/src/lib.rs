//! Mate oracle: a best-move / mate-distance service behind a line-based
//! UCI channel, in blocking and async flavors.
//!
//! Both clients speak the same protocol (`protocol` module); the blocking
//! client is the sole process-backed implementation of the [`MateOracle`]
//! seam that the puzzle session validates against, and [`engine::UciEngine`]
//! is its async counterpart for callers already on a runtime.

pub mod blocking;
pub mod engine;
pub mod protocol;

use thiserror::Error;

pub use blocking::BlockingUciEngine;
pub use engine::UciEngine;
pub use protocol::{Analysis, MateScore};

#[derive(Error, Debug)]
pub enum OracleError {
    /// The engine process could not be started. Permanent: report once and
    /// degrade to canonical-only validation.
    #[error("oracle unavailable: {0}")]
    Spawn(String),

    /// The request/response channel broke mid-session.
    #[error("oracle channel error: {0}")]
    Channel(String),
}

/// The oracle seam the session validates through: analyze a FEN to a depth
/// and report best move plus mate verdict.
pub trait MateOracle {
    fn analyze(&mut self, fen: &str, depth: u32) -> Result<Analysis, OracleError>;
}
