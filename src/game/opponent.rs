use chess::{Board, ChessMove, MoveGen, Piece};

fn piece_value(piece: Piece) -> u32 {
    match piece {
        Piece::Pawn => 1,
        Piece::Knight | Piece::Bishop => 3,
        Piece::Rook => 5,
        Piece::Queen => 9,
        Piece::King => 0,
    }
}

/// Pick the reply for the side to move: the most valuable capture, with
/// queen promotions ahead of under-promotions; otherwise the first legal
/// move in generation order. `None` when the side to move has no moves.
pub fn choose_reply(board: &Board) -> Option<ChessMove> {
    let mut best: Option<(u32, ChessMove)> = None;

    for candidate in MoveGen::new_legal(board) {
        let victim = board.piece_on(candidate.get_dest()).map(piece_value).unwrap_or(0);
        let promotion = candidate.get_promotion().map(piece_value).unwrap_or(0);
        let score = victim * 10 + promotion;

        // Keep the first move among equals so replies stay deterministic
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, candidate));
        }
    }

    best.map(|(_, chess_move)| chess_move)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn takes_the_most_valuable_piece() {
        // White queen on d5 and knight on b5 are both en prise to the c6 pawn
        // and the e6 pawn respectively
        let board = Board::from_str("4k3/8/2p1p3/1N1Q4/8/8/8/4K3 b - - 0 1").unwrap();
        let reply = choose_reply(&board).unwrap();
        assert_eq!(reply.get_dest().to_string(), "d5");
    }

    #[test]
    fn promotes_to_a_queen() {
        let board = Board::from_str("4k3/8/8/8/8/8/p7/4K3 b - - 0 1").unwrap();
        let reply = choose_reply(&board).unwrap();
        assert_eq!(reply.get_promotion(), Some(Piece::Queen));
    }

    #[test]
    fn no_reply_when_mated() {
        let board =
            Board::from_str("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert!(choose_reply(&board).is_none());
    }

    #[test]
    fn always_answers_the_opening() {
        let board = Board::default().make_move_new(ChessMove::new(
            chess::Square::E2,
            chess::Square::E4,
            None,
        ));
        let reply = choose_reply(&board).unwrap();
        assert!(board.legal(reply));
    }
}
