use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::models::game_state::GameState;
use crate::models::messages::GameSummary;

/// Application state shared between workers
pub struct AppState {
    /// Games in progress, keyed by session token
    pub games: Mutex<HashMap<String, GameState>>,
    /// Finished games by id
    pub finished: Mutex<HashMap<u64, GameSummary>>,
    /// Games started per user
    pub game_counts: Mutex<HashMap<String, u64>>,
    next_game_id: AtomicU64,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        AppState {
            games: Mutex::new(HashMap::new()),
            finished: Mutex::new(HashMap::new()),
            game_counts: Mutex::new(HashMap::new()),
            next_game_id: AtomicU64::new(1),
            config,
        }
    }

    /// Start a game for `user_id` and return its token
    pub fn create_game(&self, user_id: &str, user_elo: u32) -> String {
        let token = Uuid::new_v4().to_string();
        let game_id = self.next_game_id.fetch_add(1, Ordering::Relaxed);

        let game_number = {
            let mut counts = lock(&self.game_counts);
            let count = counts.entry(user_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        info!("Created game {} (#{} for {}) with token {}", game_id, game_number, user_id, token);
        lock(&self.games).insert(token.clone(), GameState::new(game_id, user_id.to_string(), user_elo, game_number));
        token
    }

    /// Retire a finished game: its token stops working and its summary is kept
    pub fn finish_game(&self, token: &str) -> Option<GameSummary> {
        let game = lock(&self.games).remove(token)?;
        let summary = game.summary(self.config.max_move_time());
        info!(
            "Game {} finished: {}",
            game.game_id,
            summary.end_reason.as_deref().unwrap_or("unknown")
        );
        lock(&self.finished).insert(game.game_id, summary.clone());
        Some(summary)
    }

    /// Number of games `user_id` has started so far
    pub fn games_started(&self, user_id: &str) -> u64 {
        lock(&self.game_counts).get(user_id).copied().unwrap_or(0)
    }
}

/// Lock a table, carrying on with the data if another worker panicked
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
