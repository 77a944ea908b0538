use chess::{Color, Piece, Square};
use std::fmt;
use std::str::FromStr;

use crate::error::RulesError;

/// Widget piece identifier such as `wP` or `bK`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceCode {
    pub color: Color,
    pub piece: Piece,
}

impl PieceCode {
    pub fn new(color: Color, piece: Piece) -> Self {
        PieceCode { color, piece }
    }
}

impl FromStr for PieceCode {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let color = match chars.next() {
            Some('w') => Color::White,
            Some('b') => Color::Black,
            _ => return Err(RulesError::InvalidPiece(s.to_string())),
        };
        let piece = chars
            .next()
            .and_then(piece_from_letter)
            .ok_or_else(|| RulesError::InvalidPiece(s.to_string()))?;
        if chars.next().is_some() {
            return Err(RulesError::InvalidPiece(s.to_string()));
        }
        Ok(PieceCode { color, piece })
    }
}

impl fmt::Display for PieceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.color {
            Color::White => 'w',
            Color::Black => 'b',
        };
        write!(f, "{}{}", prefix, piece_letter(self.piece))
    }
}

/// Uppercase letter for a piece kind
pub fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

pub fn piece_from_letter(letter: char) -> Option<Piece> {
    match letter.to_ascii_uppercase() {
        'P' => Some(Piece::Pawn),
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

/// FEN letter: uppercase for white, lowercase for black
pub fn fen_letter(piece: Piece, color: Color) -> char {
    let letter = piece_letter(piece);
    match color {
        Color::White => letter,
        Color::Black => letter.to_ascii_lowercase(),
    }
}

/// Parse an algebraic square name, accepting either case
pub fn parse_square(name: &str) -> Result<Square, RulesError> {
    Square::from_str(&name.to_lowercase()).map_err(|_| RulesError::InvalidSquare(name.to_string()))
}
