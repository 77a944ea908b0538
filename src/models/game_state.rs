use chess::Color;
use std::time::{Duration, Instant};

use crate::game::piece::{piece_letter, PieceCode};
use crate::game::rules::{AppliedMove, ChessRules, RulesModel};
use crate::game::utils::color_to_string;
use crate::models::messages::{GameSummary, MoveRecord, TimedMove};

/// Side the human player moves; the service answers for the other one
pub const PLAYER_COLOR: Color = Color::White;

/// Server-side record of one game
pub struct GameState {
    pub game_id: u64,
    pub rules: ChessRules,
    pub user_id: String,
    pub user_elo: u32,
    /// How many games this user has started, this one included
    pub game_number: u64,
    pub started: Instant,
    pub moves: Vec<MoveRecord>,
    pub end_reason: Option<String>,
    pub winner: Option<Color>,
}

impl GameState {
    pub fn new(game_id: u64, user_id: String, user_elo: u32, game_number: u64) -> Self {
        GameState {
            game_id,
            rules: ChessRules::new(),
            user_id,
            user_elo,
            game_number,
            started: Instant::now(),
            moves: Vec::new(),
            end_reason: None,
            winner: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.end_reason.is_some()
    }

    pub fn record(&mut self, applied: &AppliedMove, old_fen: String) {
        let elapsed = self.started.elapsed();
        self.record_at(applied, old_fen, elapsed);
    }

    /// Log a move made `elapsed` after the game started
    pub fn record_at(&mut self, applied: &AppliedMove, old_fen: String, elapsed: Duration) {
        self.moves.push(MoveRecord {
            source: applied.from.to_string(),
            target: applied.to.to_string(),
            piece: PieceCode::new(applied.color, applied.piece).to_string(),
            color: color_to_string(applied.color),
            old_fen,
            new_fen: self.rules.fen(),
            castling: applied.castling().to_string(),
            promotion: applied
                .promotion
                .map(|piece| piece_letter(piece).to_ascii_lowercase().to_string()),
            timestamp_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
    }

    /// Mark the game finished if the position or the clock says so
    pub fn check_end(&mut self, max_game_time: Duration) -> bool {
        if self.is_over() {
            return true;
        }

        if self.rules.in_checkmate() {
            self.end_reason = Some("checkmate".to_string());
            self.winner = Some(!self.rules.side_to_move());
        } else if self.rules.in_draw() {
            self.end_reason = Some("draw".to_string());
        } else if self.started.elapsed() >= max_game_time {
            self.end_reason = Some("timeout".to_string());
        }

        self.is_over()
    }

    /// Post-game report; moves slower than `max_move_time` are flagged
    pub fn summary(&self, max_move_time: Duration) -> GameSummary {
        let max_ms = u64::try_from(max_move_time.as_millis()).unwrap_or(u64::MAX);
        let player = color_to_string(PLAYER_COLOR);

        let mut moves = Vec::with_capacity(self.moves.len());
        let mut previous_ms = 0;
        let mut user_move_count = 0;
        let mut user_total_ms = 0;
        for (index, record) in self.moves.iter().enumerate() {
            let draw_ms = record.timestamp_ms.saturating_sub(previous_ms);
            previous_ms = record.timestamp_ms;
            if record.color == player {
                user_move_count += 1;
                user_total_ms += draw_ms;
            }
            moves.push(TimedMove {
                record: record.clone(),
                move_number: index as u32 + 1,
                draw_time: draw_ms as f64 / 1000.0,
                overdrawn: draw_ms > max_ms,
            });
        }

        let avg_move_duration = if user_move_count == 0 {
            0.0
        } else {
            (user_total_ms as f64 / user_move_count as f64).round() / 1000.0
        };

        GameSummary {
            game_id: self.game_id,
            user_id: self.user_id.clone(),
            end_reason: self.end_reason.clone(),
            winner: self.winner.map(color_to_string),
            moves,
            user_move_count,
            avg_move_duration,
        }
    }
}
