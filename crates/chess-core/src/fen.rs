//! FEN encoding and decoding for `Position`.
//!
//! Six whitespace-separated fields; the castling, en-passant, and clock
//! fields are optional on input and default to `-`, `-`, `0`, `1`.

use thiserror::Error;

use crate::position::Position;
use crate::types::{CastlingRights, Color, Piece, PieceKind, Square};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FenError {
    #[error("FEN needs at least piece placement and active color")]
    MissingFields,
    #[error("piece placement must have 8 ranks, got {0}")]
    BadRankCount(usize),
    #[error("rank {0} of the piece placement does not describe 8 files")]
    BadRankWidth(usize),
    #[error("unknown piece letter '{0}'")]
    UnknownPiece(char),
    #[error("invalid active color '{0}'")]
    BadActiveColor(String),
    #[error("invalid castling field '{0}'")]
    BadCastling(String),
    #[error("invalid en-passant field '{0}'")]
    BadEnPassant(String),
    #[error("invalid clock field '{0}'")]
    BadClock(String),
    #[error("expected exactly one king per side, found {white} white and {black} black")]
    BadKingCount { white: usize, black: usize },
}

impl Position {
    /// Parse a FEN string.
    ///
    /// Rejects placements that do not decompose into 8 ranks of 8 files,
    /// unknown piece letters, and boards without exactly one king per side.
    pub fn from_fen(text: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(FenError::MissingFields);
        }

        let mut board: [Option<Piece>; 64] = [None; 64];
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::BadRankCount(ranks.len()));
        }
        let mut white_kings = Vec::new();
        let mut black_kings = Vec::new();
        for (row, rank) in ranks.iter().enumerate() {
            let mut file = 0u8;
            for c in rank.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                    continue;
                }
                let piece = Piece::from_fen_char(c).ok_or(FenError::UnknownPiece(c))?;
                if file >= 8 {
                    return Err(FenError::BadRankWidth(row + 1));
                }
                let square = Square::from_coords(file, row as u8);
                if piece.kind == PieceKind::King {
                    match piece.color {
                        Color::White => white_kings.push(square),
                        Color::Black => black_kings.push(square),
                    }
                }
                board[square.index()] = Some(piece);
                file += 1;
            }
            if file != 8 {
                return Err(FenError::BadRankWidth(row + 1));
            }
        }
        if white_kings.len() != 1 || black_kings.len() != 1 {
            return Err(FenError::BadKingCount {
                white: white_kings.len(),
                black: black_kings.len(),
            });
        }

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::BadActiveColor(other.to_string())),
        };

        let castling = match fields.get(2) {
            None | Some(&"-") => CastlingRights::none(),
            Some(field) => {
                let mut rights = CastlingRights::none();
                for c in field.chars() {
                    let flag = match c {
                        'K' => CastlingRights::WHITE_KINGSIDE,
                        'Q' => CastlingRights::WHITE_QUEENSIDE,
                        'k' => CastlingRights::BLACK_KINGSIDE,
                        'q' => CastlingRights::BLACK_QUEENSIDE,
                        _ => return Err(FenError::BadCastling(field.to_string())),
                    };
                    rights.set(flag);
                }
                rights
            }
        };

        let en_passant = match fields.get(3) {
            None | Some(&"-") => None,
            Some(field) => Some(
                Square::from_algebraic(field)
                    .map_err(|_| FenError::BadEnPassant(field.to_string()))?,
            ),
        };

        let halfmove_clock = match fields.get(4) {
            None => 0,
            Some(field) => field
                .parse()
                .map_err(|_| FenError::BadClock(field.to_string()))?,
        };
        let fullmove_number = match fields.get(5) {
            None => 1,
            Some(field) => field
                .parse()
                .map_err(|_| FenError::BadClock(field.to_string()))?,
        };

        Ok(Position {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            kings: [white_kings[0], black_kings[0]],
        })
    }

    /// Render the position as a canonical six-field FEN string.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for row in 0..8u8 {
            if row > 0 {
                placement.push('/');
            }
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(Square::from_coords(file, row)) {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
        }

        let active = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let en_passant = match self.en_passant {
            Some(square) => square.to_string(),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement,
            active,
            self.castling.to_fen_field(),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    #[test]
    fn startpos_round_trips_byte_identical() {
        let pos = Position::from_fen(START_FEN).unwrap();
        assert_eq!(pos.to_fen(), START_FEN);
    }

    #[test]
    fn round_trip_reparses_to_equal_position() {
        let fens = [
            "r1bqkbnr/pppp1ppp/2n5/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 0 1",
            "8/8/8/8/4N3/8/8/K6k w - - 12 40",
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
        ];
        for fen in fens {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_fen(), fen);
            assert_eq!(Position::from_fen(&pos.to_fen()).unwrap(), pos);
        }
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let pos = Position::from_fen("8/8/8/8/8/8/k7/K7 w").unwrap();
        assert_eq!(pos.castling(), CastlingRights::none());
        assert_eq!(pos.en_passant(), None);
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
        assert_eq!(pos.to_fen(), "8/8/8/8/8/8/k7/K7 w - - 0 1");
    }

    #[test]
    fn king_cache_matches_board_after_parse() {
        let pos = Position::from_fen("R5k1/5ppp/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(pos.king_square(Color::Black).to_string(), "g8");
        assert_eq!(pos.king_square(Color::White).to_string(), "e1");
    }

    #[test]
    fn malformed_fens_are_rejected() {
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8 w - - 0 1"),
            Err(FenError::BadRankCount(7))
        );
        assert_eq!(
            Position::from_fen("9/8/8/8/8/8/k7/K7 w"),
            Err(FenError::BadRankWidth(1))
        );
        assert_eq!(
            Position::from_fen("7x/8/8/8/8/8/k7/K7 w"),
            Err(FenError::UnknownPiece('x'))
        );
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/k7/K7 x"),
            Err(FenError::BadActiveColor("x".to_string()))
        );
        assert_eq!(Position::from_fen(""), Err(FenError::MissingFields));
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/KK6 w"),
            Err(FenError::BadKingCount { white: 2, black: 0 })
        );
    }
}
