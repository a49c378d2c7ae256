//! The position value type and the move executor.
//!
//! A `Position` is a plain value owned by whoever needs one; there is no
//! shared global board. Legality probing and rendering work on clones.

use std::fmt;

use thiserror::Error;

use crate::moves::Move;
use crate::types::{CastlingRights, Color, Piece, PieceKind, Square};

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Error, Debug, PartialEq, Eq)]
#[error("illegal move {0}")]
pub struct IllegalMoveError(pub Move);

/// A full chess position: board contents, side to move, castling rights,
/// en-passant target, clocks, and a cached king square per color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub(crate) board: [Option<Piece>; 64],
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) kings: [Square; 2],
}

impl Position {
    /// The standard starting position.
    pub fn startpos() -> Position {
        Position::from_fen(START_FEN).expect("start position FEN parses")
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index()]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Cached king square for `color`; kept in sync by the executor.
    pub fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    /// Apply a move after checking it against the legal-move set.
    pub fn play(&mut self, mv: &Move) -> Result<(), IllegalMoveError> {
        if !self.legal_moves_from(mv.from).contains(mv) {
            return Err(IllegalMoveError(*mv));
        }
        self.play_unchecked(mv);
        Ok(())
    }

    /// Apply a move assumed legal: relocates the castling rook, removes the
    /// en-passant victim, applies promotion, and updates rights, clocks,
    /// the king cache, and the side to move.
    pub fn play_unchecked(&mut self, mv: &Move) {
        let Some(piece) = self.board[mv.from.index()] else {
            debug_assert!(false, "play_unchecked from an empty square");
            return;
        };
        let mover = piece.color;
        let mut is_capture = self.board[mv.to.index()].is_some();

        // En-passant capture: the victim sits behind the target square.
        if piece.kind == PieceKind::Pawn && Some(mv.to) == self.en_passant {
            let behind = match mover {
                Color::White => 1,
                Color::Black => -1,
            };
            if let Some(victim) = mv.to.offset(0, behind) {
                self.board[victim.index()] = None;
                is_capture = true;
            }
        }

        // Castling: a king moving two files drags the rook across.
        if piece.kind == PieceKind::King && mv.from.file().abs_diff(mv.to.file()) == 2 {
            let row = mv.from.row();
            let (rook_from, rook_to) = if mv.to.file() == 6 {
                (Square::from_coords(7, row), Square::from_coords(5, row))
            } else {
                (Square::from_coords(0, row), Square::from_coords(3, row))
            };
            self.board[rook_to.index()] = self.board[rook_from.index()].take();
        }

        // Move the piece, applying promotion.
        let landed = match mv.promotion {
            Some(kind) => Piece::new(mover, kind),
            None => piece,
        };
        self.board[mv.from.index()] = None;
        self.board[mv.to.index()] = Some(landed);

        if piece.kind == PieceKind::King {
            self.kings[mover.index()] = mv.to;
            self.castling.clear(
                CastlingRights::kingside_flag(mover) | CastlingRights::queenside_flag(mover),
            );
        }
        self.update_rook_rights(mv.from);
        self.update_rook_rights(mv.to);

        // A double pawn push opens the intermediate square to en passant.
        self.en_passant = if piece.kind == PieceKind::Pawn
            && mv.from.row().abs_diff(mv.to.row()) == 2
        {
            let step = match mover {
                Color::White => -1,
                Color::Black => 1,
            };
            mv.from.offset(0, step)
        } else {
            None
        };

        if piece.kind == PieceKind::Pawn || is_capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if mover == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = mover.opponent();
    }

    /// Drop the castling right tied to a rook home square that was vacated
    /// or captured onto.
    fn update_rook_rights(&mut self, square: Square) {
        let flag = match (square.file(), square.row()) {
            (0, 7) => CastlingRights::WHITE_QUEENSIDE,
            (7, 7) => CastlingRights::WHITE_KINGSIDE,
            (0, 0) => CastlingRights::BLACK_QUEENSIDE,
            (7, 0) => CastlingRights::BLACK_KINGSIDE,
            _ => return,
        };
        self.castling.clear(flag);
    }

    /// Is `color`'s king currently attacked?
    pub fn in_check(&self, color: Color) -> bool {
        self.is_square_attacked(self.king_square(color), color.opponent())
    }

    fn has_any_legal_move(&self) -> bool {
        for square in Square::all() {
            if let Some(piece) = self.piece_at(square) {
                if piece.color == self.side_to_move && !self.legal_moves_from(square).is_empty() {
                    return true;
                }
            }
        }
        false
    }

    /// Side to move is in check with no legal reply.
    pub fn is_checkmate(&self) -> bool {
        self.in_check(self.side_to_move) && !self.has_any_legal_move()
    }

    /// Side to move has no legal reply but is not in check.
    pub fn is_stalemate(&self) -> bool {
        !self.in_check(self.side_to_move) && !self.has_any_legal_move()
    }
}

impl fmt::Display for Position {
    /// Board grid from White's perspective, FEN letters, `.` for empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..8u8 {
            write!(f, "{} ", 8 - row)?;
            for file in 0..8u8 {
                let square = Square::from_coords(file, row);
                match self.piece_at(square) {
                    Some(piece) => write!(f, "{} ", piece.fen_char())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}
