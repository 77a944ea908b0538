use chess::{BitBoard, Board, Color, Piece, EMPTY};

use crate::game::rules::RulesModel;

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Human readable whose-turn / check / checkmate / draw line
pub fn status_text(rules: &dyn RulesModel) -> String {
    let mover = match rules.side_to_move() {
        Color::White => "White",
        Color::Black => "Black",
    };

    if rules.in_checkmate() {
        format!("Game over, {} is in checkmate.", mover)
    } else if rules.in_draw() {
        "Game over, drawn position".to_string()
    } else if rules.in_check() {
        format!("{} to move, {} is in check", mover, mover)
    } else {
        format!("{} to move", mover)
    }
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy != EMPTY {
        return false;
    }

    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);

    // King vs king, or a single minor piece
    if (knights | bishops).popcnt() <= 1 {
        return true;
    }

    // Bishops only, all of them on the same square colour
    knights == EMPTY && same_square_colour(bishops)
}

fn same_square_colour(pieces: BitBoard) -> bool {
    let mut colours = pieces.map(|square| (square.get_rank().to_index() + square.get_file().to_index()) % 2);
    match colours.next() {
        Some(first) => colours.all(|colour| colour == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::ChessRules;
    use std::str::FromStr;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    #[test]
    fn bare_kings_and_single_minor_are_insufficient() {
        assert!(has_insufficient_material(&board("8/8/4k3/8/8/4K3/8/8 w - - 0 1")));
        assert!(has_insufficient_material(&board("8/8/4k3/8/8/4KN2/8/8 w - - 0 1")));
        assert!(has_insufficient_material(&board("8/8/4kb2/8/8/4K3/8/8 w - - 0 1")));
    }

    #[test]
    fn same_coloured_bishops_are_insufficient() {
        // c1 and f4 are both dark squares
        assert!(has_insufficient_material(&board("8/8/4k3/8/5b2/4K3/8/2B5 w - - 0 1")));
        // c1 dark, f5 light
        assert!(!has_insufficient_material(&board("8/8/4k3/5b2/8/4K3/8/2B5 w - - 0 1")));
    }

    #[test]
    fn pawns_or_heavy_pieces_are_sufficient() {
        assert!(!has_insufficient_material(&Board::default()));
        assert!(!has_insufficient_material(&board("8/8/4k3/8/8/4K3/4P3/8 w - - 0 1")));
        assert!(!has_insufficient_material(&board("8/8/4k3/8/8/4K3/8/R7 w - - 0 1")));
    }

    #[test]
    fn status_text_reports_turn_check_and_mate() {
        let rules = ChessRules::new();
        assert_eq!(status_text(&rules), "White to move");

        let check = ChessRules::from_fen("4k3/8/8/8/8/8/8/4R1K1 b - - 0 1").unwrap();
        assert_eq!(status_text(&check), "Black to move, Black is in check");

        // Fool's mate
        let mate = ChessRules::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        assert_eq!(status_text(&mate), "Game over, White is in checkmate.");

        let stalemate = ChessRules::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(status_text(&stalemate), "Game over, drawn position");
    }
}
