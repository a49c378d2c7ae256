//! Pseudo-legal move generation, the attack predicate, and the legality
//! filter.
//!
//! Generation walks (file, row) coordinates through `Square::offset`, so a
//! ray or jump that would wrap around a board edge simply falls off the
//! board instead. Legality is decided by simulation: clone the position,
//! apply the candidate, and test whether the mover's own king is attacked.

use crate::moves::Move;
use crate::position::Position;
use crate::types::{CastlingRights, Color, Piece, PieceKind, Square};

const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const KING_STEPS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const BISHOP_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl Position {
    /// Moves the piece on `from` could make ignoring king safety. Empty
    /// squares generate nothing.
    pub fn pseudo_legal_from(&self, from: Square) -> Vec<Move> {
        let Some(piece) = self.piece_at(from) else {
            return Vec::new();
        };
        let mut moves = Vec::new();
        match piece.kind {
            PieceKind::Pawn => self.pawn_moves(from, piece.color, &mut moves),
            PieceKind::Knight => self.jump_moves(from, piece.color, &KNIGHT_JUMPS, &mut moves),
            PieceKind::Bishop => self.ray_moves(from, piece.color, &BISHOP_DIRS, &mut moves),
            PieceKind::Rook => self.ray_moves(from, piece.color, &ROOK_DIRS, &mut moves),
            PieceKind::Queen => {
                self.ray_moves(from, piece.color, &BISHOP_DIRS, &mut moves);
                self.ray_moves(from, piece.color, &ROOK_DIRS, &mut moves);
            }
            PieceKind::King => {
                self.jump_moves(from, piece.color, &KING_STEPS, &mut moves);
                self.castling_moves(from, piece.color, &mut moves);
            }
        }
        moves
    }

    fn pawn_moves(&self, from: Square, color: Color, out: &mut Vec<Move>) {
        let (step, start_row) = match color {
            Color::White => (-1, 6),
            Color::Black => (1, 1),
        };

        if let Some(to) = from.offset(0, step) {
            if self.piece_at(to).is_none() {
                push_pawn_move(from, to, out);
                if from.row() == start_row {
                    if let Some(two) = from.offset(0, 2 * step) {
                        if self.piece_at(two).is_none() {
                            out.push(Move::new(from, two));
                        }
                    }
                }
            }
        }

        for file_delta in [-1, 1] {
            let Some(to) = from.offset(file_delta, step) else {
                continue;
            };
            let takes_piece = matches!(self.piece_at(to), Some(p) if p.color != color);
            if takes_piece || Some(to) == self.en_passant() {
                push_pawn_move(from, to, out);
            }
        }
    }

    fn jump_moves(&self, from: Square, color: Color, jumps: &[(i8, i8)], out: &mut Vec<Move>) {
        for &(file_delta, row_delta) in jumps {
            if let Some(to) = from.offset(file_delta, row_delta) {
                match self.piece_at(to) {
                    Some(p) if p.color == color => {}
                    _ => out.push(Move::new(from, to)),
                }
            }
        }
    }

    fn ray_moves(&self, from: Square, color: Color, dirs: &[(i8, i8)], out: &mut Vec<Move>) {
        for &(file_delta, row_delta) in dirs {
            let mut square = from;
            while let Some(to) = square.offset(file_delta, row_delta) {
                match self.piece_at(to) {
                    None => out.push(Move::new(from, to)),
                    Some(p) => {
                        if p.color != color {
                            out.push(Move::new(from, to));
                        }
                        break;
                    }
                }
                square = to;
            }
        }
    }

    /// Castling pseudo-targets: rights intact, king and rook on their home
    /// squares, intervening squares empty. Attack constraints are the
    /// legality filter's job.
    fn castling_moves(&self, from: Square, color: Color, out: &mut Vec<Move>) {
        let home_row = match color {
            Color::White => 7,
            Color::Black => 0,
        };
        if from != Square::from_coords(4, home_row) {
            return;
        }
        let rook = Some(Piece::new(color, PieceKind::Rook));

        if self.castling().has(CastlingRights::kingside_flag(color))
            && self.piece_at(Square::from_coords(7, home_row)) == rook
            && (5..=6).all(|f| self.piece_at(Square::from_coords(f, home_row)).is_none())
        {
            out.push(Move::new(from, Square::from_coords(6, home_row)));
        }
        if self.castling().has(CastlingRights::queenside_flag(color))
            && self.piece_at(Square::from_coords(0, home_row)) == rook
            && (1..=3).all(|f| self.piece_at(Square::from_coords(f, home_row)).is_none())
        {
            out.push(Move::new(from, Square::from_coords(2, home_row)));
        }
    }

    /// Is `square` attacked by any piece of `by`? Re-derives pawn, knight,
    /// king, and slider attack patterns from the target square outward.
    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        // A pawn of `by` attacks this square from one row closer to its
        // own starting side.
        let pawn_row = match by {
            Color::White => 1,
            Color::Black => -1,
        };
        for file_delta in [-1, 1] {
            if let Some(origin) = square.offset(file_delta, pawn_row) {
                if self.piece_at(origin) == Some(Piece::new(by, PieceKind::Pawn)) {
                    return true;
                }
            }
        }

        for &(file_delta, row_delta) in &KNIGHT_JUMPS {
            if let Some(origin) = square.offset(file_delta, row_delta) {
                if self.piece_at(origin) == Some(Piece::new(by, PieceKind::Knight)) {
                    return true;
                }
            }
        }

        for &(file_delta, row_delta) in &KING_STEPS {
            if let Some(origin) = square.offset(file_delta, row_delta) {
                if self.piece_at(origin) == Some(Piece::new(by, PieceKind::King)) {
                    return true;
                }
            }
        }

        self.ray_attack(square, by, &BISHOP_DIRS, PieceKind::Bishop)
            || self.ray_attack(square, by, &ROOK_DIRS, PieceKind::Rook)
    }

    fn ray_attack(&self, square: Square, by: Color, dirs: &[(i8, i8)], kind: PieceKind) -> bool {
        for &(file_delta, row_delta) in dirs {
            let mut current = square;
            while let Some(next) = current.offset(file_delta, row_delta) {
                if let Some(piece) = self.piece_at(next) {
                    if piece.color == by
                        && (piece.kind == kind || piece.kind == PieceKind::Queen)
                    {
                        return true;
                    }
                    break;
                }
                current = next;
            }
        }
        false
    }

    /// Fully legal moves for the piece on `from`: pseudo-legal candidates
    /// that do not leave the mover's own king attacked, with the extra
    /// castling constraints (not in check, transit square safe).
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        let Some(piece) = self.piece_at(from) else {
            return Vec::new();
        };
        let opponent = piece.color.opponent();
        let mut legal = Vec::new();
        for mv in self.pseudo_legal_from(from) {
            if piece.kind == PieceKind::King && from.file().abs_diff(mv.to.file()) == 2 {
                if self.in_check(piece.color) {
                    continue;
                }
                let transit =
                    Square::from_coords((from.file() + mv.to.file()) / 2, from.row());
                if self.is_square_attacked(transit, opponent) {
                    continue;
                }
            }
            // Probe on a clone so the observable position never mutates.
            let mut probe = self.clone();
            probe.play_unchecked(&mv);
            if !probe.is_square_attacked(probe.king_square(piece.color), opponent) {
                legal.push(mv);
            }
        }
        legal
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        for square in Square::all() {
            if let Some(piece) = self.piece_at(square) {
                if piece.color == self.side_to_move() {
                    moves.extend(self.legal_moves_from(square));
                }
            }
        }
        moves
    }
}

fn push_pawn_move(from: Square, to: Square, out: &mut Vec<Move>) {
    if to.row() == 0 || to.row() == 7 {
        for kind in PieceKind::PROMOTIONS {
            out.push(Move::promoting(from, to, kind));
        }
    } else {
        out.push(Move::new(from, to));
    }
}
