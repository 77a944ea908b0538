use chess::{Color, Piece, Rank, Square};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::game::piece::PieceCode;
use crate::game::rules::RulesModel;

/// Which sides the promotion heuristic recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromotionDetection {
    /// Both colours promote on their last rank
    #[default]
    Symmetric,
    /// Only white pawns are flagged, as older move services expect
    WhiteOnly,
}

impl FromStr for PromotionDetection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "symmetric" => Ok(PromotionDetection::Symmetric),
            "white-only" | "white_only" | "white" => Ok(PromotionDetection::WhiteOnly),
            other => Err(format!("unknown promotion detection mode: {}", other)),
        }
    }
}

/// Whether a dragged piece is a pawn stepping onto its last rank
pub fn is_promotion(
    detection: PromotionDetection,
    side_to_move: Color,
    from: Square,
    to: Square,
    piece: PieceCode,
) -> bool {
    if piece.piece != Piece::Pawn || piece.color != side_to_move {
        return false;
    }

    match side_to_move {
        Color::White => from.get_rank() == Rank::Seventh && to.get_rank() == Rank::Eighth,
        Color::Black => {
            detection == PromotionDetection::Symmetric
                && from.get_rank() == Rank::Second
                && to.get_rank() == Rank::First
        }
    }
}

/// Promotion piece to report for a drop, confirmed against the rules model
/// without touching it. The client always promotes to a queen.
pub fn promotion_choice(
    detection: PromotionDetection,
    rules: &dyn RulesModel,
    from: Square,
    to: Square,
    piece: PieceCode,
) -> Option<Piece> {
    let flagged = is_promotion(detection, rules.side_to_move(), from, to, piece);
    (flagged && rules.is_legal(from, to, Some(Piece::Queen))).then_some(Piece::Queen)
}
