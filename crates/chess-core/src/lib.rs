//! Chess rules core: position model, FEN codec, move generation, legality
//! filtering, and the move executor.
//!
//! Everything here is a plain value with no global state; a `Position` is
//! cheap to clone and every operation takes the position it acts on.

pub mod fen;
pub mod movegen;
pub mod moves;
pub mod position;
pub mod types;

pub use fen::FenError;
pub use moves::{Move, MoveParseError};
pub use position::{IllegalMoveError, Position, START_FEN};
pub use types::{CastlingRights, Color, Piece, PieceKind, Square, SquareParseError};
