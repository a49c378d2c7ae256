//! Core board vocabulary: colors, pieces, squares, castling rights.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side to move / piece ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Index into per-color arrays (white = 0, black = 1).
    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Color;

    fn not(self) -> Color {
        self.opponent()
    }
}

/// The six piece types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase FEN/UCI letter for this piece type.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Legal promotion targets, in UCI order.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];
}

/// A colored piece as it sits on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(color: Color, kind: PieceKind) -> Piece {
        Piece { color, kind }
    }

    /// FEN letter: uppercase for white, lowercase for black.
    pub fn fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter().to_ascii_uppercase(),
            Color::Black => self.kind.letter(),
        }
    }

    pub fn from_fen_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece { color, kind })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid square '{0}'")]
pub struct SquareParseError(pub String);

/// A board cell, indexed rank-major from the top-left as seen by White:
/// 0 = a8, 7 = h8, 56 = a1, 63 = h1.
///
/// `file = index % 8` (0 = a-file), `row = index / 8` (0 = rank 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// Build from a raw 0..64 index. Panics outside the board in debug builds.
    pub fn from_index(index: u8) -> Square {
        debug_assert!(index < 64);
        Square(index)
    }

    /// Build from file (0 = a) and row (0 = rank 8).
    pub fn from_coords(file: u8, row: u8) -> Square {
        debug_assert!(file < 8 && row < 8);
        Square(row * 8 + file)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// 0 = a-file .. 7 = h-file.
    pub fn file(self) -> u8 {
        self.0 % 8
    }

    /// 0 = rank 8 .. 7 = rank 1.
    pub fn row(self) -> u8 {
        self.0 / 8
    }

    /// Chess rank digit, 1..=8.
    pub fn rank(self) -> u8 {
        8 - self.row()
    }

    /// Offset by file/row deltas, `None` when the result leaves the board.
    pub fn offset(self, file_delta: i8, row_delta: i8) -> Option<Square> {
        let file = self.file() as i8 + file_delta;
        let row = self.row() as i8 + row_delta;
        if (0..8).contains(&file) && (0..8).contains(&row) {
            Some(Square::from_coords(file as u8, row as u8))
        } else {
            None
        }
    }

    /// Parse algebraic notation, e.g. `e4`.
    pub fn from_algebraic(text: &str) -> Result<Square, SquareParseError> {
        let mut chars = text.chars();
        let (Some(f), Some(r), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(SquareParseError(text.to_string()));
        };
        if !('a'..='h').contains(&f) || !('1'..='8').contains(&r) {
            return Err(SquareParseError(text.to_string()));
        }
        let file = f as u8 - b'a';
        let row = 8 - (r as u8 - b'0');
        Ok(Square::from_coords(file, row))
    }

    /// All 64 squares in index order (a8 first, h1 last).
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank())
    }
}

/// Castling availability as a 4-bit mask, one bit per king/rook pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_KINGSIDE: u8 = 1;
    pub const WHITE_QUEENSIDE: u8 = 2;
    pub const BLACK_KINGSIDE: u8 = 4;
    pub const BLACK_QUEENSIDE: u8 = 8;

    pub fn none() -> CastlingRights {
        CastlingRights(0)
    }

    pub fn all() -> CastlingRights {
        CastlingRights(0b1111)
    }

    pub fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn clear(&mut self, flags: u8) {
        self.0 &= !flags;
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn kingside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    pub fn queenside_flag(color: Color) -> u8 {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    /// FEN castling field, `KQkq` subset or `-`.
    pub fn to_fen_field(self) -> String {
        if self.0 == 0 {
            return "-".to_string();
        }
        let mut out = String::new();
        if self.has(Self::WHITE_KINGSIDE) {
            out.push('K');
        }
        if self.has(Self::WHITE_QUEENSIDE) {
            out.push('Q');
        }
        if self.has(Self::BLACK_KINGSIDE) {
            out.push('k');
        }
        if self.has(Self::BLACK_QUEENSIDE) {
            out.push('q');
        }
        out
    }
}
