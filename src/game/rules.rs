use chess::{Board, BoardStatus, ChessMove, Color, Piece, Rank, Square, EMPTY};
use std::str::FromStr;

use crate::error::RulesError;
use crate::game::utils::has_insufficient_material;

pub const DEFAULT_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move the rules model accepted and applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub color: Color,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
}

impl AppliedMove {
    /// Castling notation for the move log, empty for ordinary moves
    pub fn castling(&self) -> &'static str {
        if self.piece != Piece::King {
            return "";
        }
        let from_file = self.from.get_file().to_index();
        let to_file = self.to.get_file().to_index();
        if to_file == from_file + 2 {
            "0-0"
        } else if to_file + 2 == from_file {
            "0-0-0"
        } else {
            ""
        }
    }
}

/// Authoritative board model: legality, game-end predicates and FEN I/O.
///
/// The visual widget only ever mirrors what this model says.
pub trait RulesModel {
    fn side_to_move(&self) -> Color;

    fn in_check(&self) -> bool;

    fn in_checkmate(&self) -> bool;

    /// Stalemate, insufficient material, fifty-move rule or threefold repetition
    fn in_draw(&self) -> bool;

    fn is_game_over(&self) -> bool {
        self.in_checkmate() || self.in_draw()
    }

    fn piece_at(&self, square: Square) -> Option<(Piece, Color)>;

    /// Side-effect free legality check; the model is left untouched
    fn is_legal(&self, from: Square, to: Square, promotion: Option<Piece>) -> bool;

    /// Apply a move. Pawns reaching the last rank promote to `promotion`,
    /// or a queen when none is given; the choice is ignored for other moves.
    /// Returns `None` and leaves the position unchanged for illegal input.
    fn try_move(&mut self, from: Square, to: Square, promotion: Option<Piece>) -> Option<AppliedMove>;

    /// Take back the last applied move
    fn undo(&mut self) -> Option<AppliedMove>;

    fn fen(&self) -> String;

    fn load_fen(&mut self, fen: &str) -> Result<(), RulesError>;
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    applied: AppliedMove,
}

/// `RulesModel` backed by the `chess` crate
#[derive(Debug, Clone)]
pub struct ChessRules {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<Snapshot>,
    // Position hashes since the last load, current position included
    hashes: Vec<u64>,
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessRules {
    pub fn new() -> Self {
        let board = Board::default();
        ChessRules {
            board,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
            hashes: vec![board.get_hash()],
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let mut rules = ChessRules::new();
        rules.load_fen(fen)?;
        Ok(rules)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Moves applied since the position was loaded
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    fn resolve(&self, from: Square, to: Square, promotion: Option<Piece>) -> Option<ChessMove> {
        let piece = self.board.piece_on(from)?;
        let color = self.board.color_on(from)?;
        let last_rank = match color {
            Color::White => Rank::Eighth,
            Color::Black => Rank::First,
        };
        let promotion = if piece == Piece::Pawn && to.get_rank() == last_rank {
            Some(promotion.unwrap_or(Piece::Queen))
        } else {
            None
        };
        let candidate = ChessMove::new(from, to, promotion);
        self.board.legal(candidate).then_some(candidate)
    }

    fn repetitions(&self) -> usize {
        let current = self.board.get_hash();
        self.hashes.iter().filter(|hash| **hash == current).count()
    }
}

impl RulesModel for ChessRules {
    fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    fn in_check(&self) -> bool {
        *self.board.checkers() != EMPTY
    }

    fn in_checkmate(&self) -> bool {
        self.board.status() == BoardStatus::Checkmate
    }

    fn in_draw(&self) -> bool {
        self.board.status() == BoardStatus::Stalemate
            || has_insufficient_material(&self.board)
            || self.halfmove_clock >= 100
            || self.repetitions() >= 3
    }

    fn piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        Some((self.board.piece_on(square)?, self.board.color_on(square)?))
    }

    fn is_legal(&self, from: Square, to: Square, promotion: Option<Piece>) -> bool {
        self.resolve(from, to, promotion).is_some()
    }

    fn try_move(&mut self, from: Square, to: Square, promotion: Option<Piece>) -> Option<AppliedMove> {
        let chess_move = self.resolve(from, to, promotion)?;
        let piece = self.board.piece_on(from)?;
        let color = self.board.side_to_move();

        // A pawn changing file onto an empty square is an en passant capture
        let en_passant = piece == Piece::Pawn
            && from.get_file() != to.get_file()
            && self.board.piece_on(to).is_none();
        let captured = if en_passant {
            Some(Piece::Pawn)
        } else {
            self.board.piece_on(to)
        };

        let applied = AppliedMove {
            from,
            to,
            piece,
            color,
            captured,
            promotion: chess_move.get_promotion(),
        };

        self.history.push(Snapshot {
            board: self.board,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            applied,
        });

        self.board = self.board.make_move_new(chess_move);
        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if color == Color::Black {
            self.fullmove_number += 1;
        }
        self.hashes.push(self.board.get_hash());

        Some(applied)
    }

    fn undo(&mut self) -> Option<AppliedMove> {
        let snapshot = self.history.pop()?;
        self.board = snapshot.board;
        self.halfmove_clock = snapshot.halfmove_clock;
        self.fullmove_number = snapshot.fullmove_number;
        self.hashes.pop();
        Some(snapshot.applied)
    }

    fn fen(&self) -> String {
        // The crate renders placement, side, castling and en passant; the
        // move counters are tracked here
        let rendered = self.board.to_string();
        let fields: Vec<&str> = rendered.split_whitespace().take(4).collect();
        format!("{} {} {}", fields.join(" "), self.halfmove_clock, self.fullmove_number)
    }

    fn load_fen(&mut self, fen: &str) -> Result<(), RulesError> {
        let board = Board::from_str(fen.trim()).map_err(|_| RulesError::InvalidFen(fen.to_string()))?;
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let halfmove_clock = fields.get(4).and_then(|f| f.parse().ok()).unwrap_or(0);
        let fullmove_number = fields.get(5).and_then(|f| f.parse().ok()).unwrap_or(1);

        self.board = board;
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
        self.history.clear();
        self.hashes = vec![board.get_hash()];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::piece::parse_square;

    fn sq(name: &str) -> Square {
        parse_square(name).unwrap()
    }

    #[test]
    fn starts_from_the_default_position() {
        let rules = ChessRules::new();
        assert_eq!(rules.fen(), DEFAULT_FEN);
        assert_eq!(rules.side_to_move(), Color::White);
        assert!(!rules.is_game_over());
    }

    #[test]
    fn applies_a_legal_move_and_tracks_counters() {
        let mut rules = ChessRules::new();
        let applied = rules.try_move(sq("e2"), sq("e4"), Some(Piece::Queen)).unwrap();
        assert_eq!(applied.piece, Piece::Pawn);
        assert_eq!(applied.promotion, None);

        let fen = rules.fen();
        assert!(fen.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq"));
        assert!(fen.ends_with(" 0 1"));

        rules.try_move(sq("g8"), sq("f6"), None).unwrap();
        assert!(rules.fen().ends_with(" 1 2"));
    }

    #[test]
    fn rejects_illegal_moves_without_side_effects() {
        let mut rules = ChessRules::new();
        assert!(rules.try_move(sq("e2"), sq("e5"), None).is_none());
        assert!(rules.try_move(sq("e7"), sq("e5"), None).is_none());
        assert!(rules.try_move(sq("e3"), sq("e4"), None).is_none());
        assert_eq!(rules.fen(), DEFAULT_FEN);
        assert_eq!(rules.history_len(), 0);
    }

    #[test]
    fn undo_restores_previous_position() {
        let mut rules = ChessRules::new();
        rules.try_move(sq("e2"), sq("e4"), None).unwrap();
        let after_first = rules.fen();
        rules.try_move(sq("e7"), sq("e5"), None).unwrap();

        let undone = rules.undo().unwrap();
        assert_eq!((undone.from, undone.to), (sq("e7"), sq("e5")));
        assert_eq!(rules.fen(), after_first);
        rules.undo().unwrap();
        assert_eq!(rules.fen(), DEFAULT_FEN);
        assert!(rules.undo().is_none());
    }

    #[test]
    fn pawn_reaching_last_rank_defaults_to_queen() {
        let mut rules = ChessRules::from_fen("8/P7/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        assert!(rules.is_legal(sq("a7"), sq("a8"), Some(Piece::Queen)));
        let applied = rules.try_move(sq("a7"), sq("a8"), None).unwrap();
        assert_eq!(applied.promotion, Some(Piece::Queen));
        assert_eq!(rules.piece_at(sq("a8")), Some((Piece::Queen, Color::White)));
    }

    #[test]
    fn is_legal_does_not_mutate() {
        let rules = ChessRules::new();
        assert!(rules.is_legal(sq("g1"), sq("f3"), None));
        assert_eq!(rules.fen(), DEFAULT_FEN);
    }

    #[test]
    fn castling_move_is_annotated() {
        let mut rules = ChessRules::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let short = rules.try_move(sq("e1"), sq("g1"), None).unwrap();
        assert_eq!(short.castling(), "0-0");
        let long = rules.try_move(sq("e8"), sq("c8"), None).unwrap();
        assert_eq!(long.castling(), "0-0-0");
    }

    #[test]
    fn threefold_repetition_is_a_draw() {
        let mut rules = ChessRules::new();
        for _ in 0..2 {
            rules.try_move(sq("g1"), sq("f3"), None).unwrap();
            rules.try_move(sq("g8"), sq("f6"), None).unwrap();
            rules.try_move(sq("f3"), sq("g1"), None).unwrap();
            rules.try_move(sq("f6"), sq("g8"), None).unwrap();
        }
        assert!(rules.in_draw());
    }

    #[test]
    fn fifty_move_rule_is_a_draw() {
        let rules = ChessRules::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
        assert!(rules.in_draw());
        assert!(rules.fen().ends_with(" 100 80"));
    }

    #[test]
    fn rejects_malformed_fen() {
        assert!(ChessRules::from_fen("not a fen").is_err());
    }
}
