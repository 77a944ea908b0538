pub mod opponent;
pub mod piece;
pub mod promotion;
pub mod rules;
pub mod utils;

pub use piece::{parse_square, PieceCode};
pub use promotion::{is_promotion, promotion_choice, PromotionDetection};
pub use rules::{AppliedMove, ChessRules, RulesModel, DEFAULT_FEN};
