use chess::{Color, File, Rank, Square};
use log::warn;

use crate::game::piece::{fen_letter, piece_from_letter, PieceCode};

/// Visual board. It mirrors the rules model and is never consulted for
/// legality.
pub trait BoardWidget {
    fn orientation(&self) -> Color;

    /// Piece placement, the first field of a FEN
    fn position(&self) -> String;

    /// Show a position given as a full FEN or a bare placement field
    fn set_position(&mut self, fen: &str);

    fn move_piece(&mut self, from: Square, to: Square, animate: bool);

    fn piece_at(&self, square: Square) -> Option<PieceCode>;

    /// Text diagram of what the widget currently shows
    fn render(&self) -> String;
}

/// Placement field of a FEN string
pub fn placement(fen: &str) -> &str {
    fen.split_whitespace().next().unwrap_or("")
}

/// Board widget for terminals and headless hosts
#[derive(Debug, Clone)]
pub struct TextBoard {
    squares: [Option<PieceCode>; 64],
    orientation: Color,
}

impl TextBoard {
    pub fn new(orientation: Color, fen: &str) -> Self {
        let mut board = TextBoard {
            squares: [None; 64],
            orientation,
        };
        board.set_position(fen);
        board
    }

    fn parse_placement(field: &str) -> Option<[Option<PieceCode>; 64]> {
        let mut squares = [None; 64];
        let rows: Vec<&str> = field.split('/').collect();
        if rows.len() != 8 {
            return None;
        }

        for (row, text) in rows.iter().enumerate() {
            let rank = 7 - row;
            let mut file = 0;
            for c in text.chars() {
                if let Some(empty) = c.to_digit(10) {
                    file += empty as usize;
                    continue;
                }
                let piece = piece_from_letter(c)?;
                let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                if file >= 8 {
                    return None;
                }
                squares[rank * 8 + file] = Some(PieceCode::new(color, piece));
                file += 1;
            }
            if file != 8 {
                return None;
            }
        }
        Some(squares)
    }
}

impl BoardWidget for TextBoard {
    fn orientation(&self) -> Color {
        self.orientation
    }

    fn position(&self) -> String {
        let mut rows = Vec::with_capacity(8);
        for rank in (0..8).rev() {
            let mut row = String::new();
            let mut empty = 0;
            for file in 0..8 {
                match self.squares[rank * 8 + file] {
                    Some(code) => {
                        if empty > 0 {
                            row.push_str(&empty.to_string());
                            empty = 0;
                        }
                        row.push(fen_letter(code.piece, code.color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                row.push_str(&empty.to_string());
            }
            rows.push(row);
        }
        rows.join("/")
    }

    fn set_position(&mut self, fen: &str) {
        match Self::parse_placement(placement(fen)) {
            Some(squares) => self.squares = squares,
            None => warn!("Ignoring unreadable position: {}", fen),
        }
    }

    fn move_piece(&mut self, from: Square, to: Square, _animate: bool) {
        let piece = self.squares[from.to_index()].take();
        if piece.is_some() {
            self.squares[to.to_index()] = piece;
        }
    }

    fn piece_at(&self, square: Square) -> Option<PieceCode> {
        self.squares[square.to_index()]
    }

    /// ASCII diagram from the orientation side's point of view
    fn render(&self) -> String {
        let ranks: Vec<usize> = match self.orientation {
            Color::White => (0..8).rev().collect(),
            Color::Black => (0..8).collect(),
        };
        let files: Vec<usize> = match self.orientation {
            Color::White => (0..8).collect(),
            Color::Black => (0..8).rev().collect(),
        };

        let mut out = String::from("  +------------------------+\n");
        for rank in &ranks {
            out.push_str(&format!("{} |", rank + 1));
            for file in &files {
                let letter = self.squares[rank * 8 + file]
                    .map(|code| fen_letter(code.piece, code.color))
                    .unwrap_or('.');
                out.push_str(&format!(" {} ", letter));
            }
            out.push_str("|\n");
        }
        out.push_str("  +------------------------+\n   ");
        for file in &files {
            out.push_str(&format!(" {} ", (b'a' + *file as u8) as char));
        }
        out.push('\n');
        out
    }
}

/// Square from zero-based file and rank indices
pub fn square_at(file: usize, rank: usize) -> Square {
    Square::make_square(Rank::from_index(rank), File::from_index(file))
}
