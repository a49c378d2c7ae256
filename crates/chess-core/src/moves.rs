//! Moves and their canonical UCI text form (`e2e4`, `e7e8q`).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::{PieceKind, Square};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MoveParseError {
    #[error("move '{0}' must be 4 or 5 characters")]
    BadLength(String),
    #[error("move '{0}' has an invalid square")]
    BadSquare(String),
    #[error("move '{0}' has an invalid promotion piece")]
    BadPromotion(String),
}

/// A move as submitted or rendered: source, destination, optional promotion.
///
/// Castling is encoded as the king's two-file move (`e1g1`); en passant as
/// the capturing pawn's diagonal step. Promotion pieces are always lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Move {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Square, to: Square, kind: PieceKind) -> Move {
        Move {
            from,
            to,
            promotion: Some(kind),
        }
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(text: &str) -> Result<Move, MoveParseError> {
        // ASCII gate keeps the byte slices below on char boundaries.
        if !text.is_ascii() || (text.len() != 4 && text.len() != 5) {
            return Err(MoveParseError::BadLength(text.to_string()));
        }
        let from = Square::from_algebraic(&text[0..2])
            .map_err(|_| MoveParseError::BadSquare(text.to_string()))?;
        let to = Square::from_algebraic(&text[2..4])
            .map_err(|_| MoveParseError::BadSquare(text.to_string()))?;
        let promotion = match text.as_bytes().get(4) {
            None => None,
            Some(&c) => {
                let kind = PieceKind::from_letter(c as char)
                    .filter(|k| PieceKind::PROMOTIONS.contains(k))
                    .ok_or_else(|| MoveParseError::BadPromotion(text.to_string()))?;
                // Promotion letters are lowercase in the canonical form.
                if !(c as char).is_ascii_lowercase() {
                    return Err(MoveParseError::BadPromotion(text.to_string()));
                }
                Some(kind)
            }
        };
        Ok(Move {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_move() {
        let mv: Move = "e2e4".parse().unwrap();
        assert_eq!(mv.from.to_string(), "e2");
        assert_eq!(mv.to.to_string(), "e4");
        assert_eq!(mv.promotion, None);
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn parse_promotion() {
        let mv: Move = "e7e8q".parse().unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7e8q");
    }

    #[test]
    fn reject_malformed() {
        assert!("e2".parse::<Move>().is_err());
        assert!("e2e9".parse::<Move>().is_err());
        assert!("e7e8k".parse::<Move>().is_err());
        assert!("e7e8Q".parse::<Move>().is_err());
        assert!("e2e4e5".parse::<Move>().is_err());
    }

    #[test]
    fn reject_non_ascii_without_panicking() {
        // Multi-byte chars must fail cleanly, whatever byte length they give.
        assert_eq!(
            "aé2".parse::<Move>(),
            Err(MoveParseError::BadLength("aé2".to_string()))
        );
        assert!("é2e4".parse::<Move>().is_err());
        assert!("e2e4é".parse::<Move>().is_err());
    }
}
