use chess::Color;
use log::warn;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::game::promotion::PromotionDetection;
use crate::ui::countdown::{CountdownFloor, CountdownSettings};

/// Behaviour of one game session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Side the local player moves; also the widget orientation
    pub player_color: Color,
    pub countdown: CountdownSettings,
    pub redirect_seconds: u32,
    pub promotion: PromotionDetection,
    /// Skip the redirect countdown when the server hands over a next game
    pub navigate_immediately: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            player_color: Color::White,
            countdown: CountdownSettings::default(),
            redirect_seconds: 10,
            promotion: PromotionDetection::default(),
            navigate_immediately: false,
        }
    }
}

/// Terminal client settings
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub server_url: String,
    /// Page that creates or loads the game, e.g. `/new/{user_id}/{elo}`
    pub game_path: String,
    /// Cookies to start with, as a `name=value; ...` string
    pub cookie: Option<String>,
    pub token_cookie: String,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: "http://127.0.0.1:8000".to_string(),
            game_path: "/new/example/1285".to_string(),
            cookie: None,
            token_cookie: "token".to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ClientConfig::default();
        let countdown = CountdownSettings {
            duration: parse_or(&lookup, "CHESS_TURN_SECONDS", defaults.session.countdown.duration),
            urgent_threshold: parse_or(
                &lookup,
                "CHESS_URGENT_SECONDS",
                defaults.session.countdown.urgent_threshold,
            ),
            tick: Duration::from_millis(parse_or(&lookup, "CHESS_TICK_MILLIS", 1000)),
            floor: parse_or(&lookup, "CHESS_COUNTDOWN_FLOOR", CountdownFloor::Zero),
        };

        let player_color = match lookup("CHESS_PLAYER_COLOR").as_deref() {
            Some("black") => Color::Black,
            Some("white") | None => Color::White,
            Some(other) => {
                warn!("Unknown CHESS_PLAYER_COLOR {:?}, playing white", other);
                Color::White
            }
        };

        ClientConfig {
            server_url: lookup("CHESS_SERVER_URL").unwrap_or(defaults.server_url),
            game_path: lookup("CHESS_GAME_PATH").unwrap_or(defaults.game_path),
            cookie: lookup("CHESS_COOKIE"),
            token_cookie: lookup("CHESS_TOKEN_COOKIE").unwrap_or(defaults.token_cookie),
            session: SessionConfig {
                player_color,
                countdown,
                redirect_seconds: parse_or(&lookup, "CHESS_REDIRECT_SECONDS", defaults.session.redirect_seconds),
                promotion: parse_or(&lookup, "CHESS_PROMOTION_DETECTION", defaults.session.promotion),
                navigate_immediately: parse_or(&lookup, "CHESS_NAVIGATE_IMMEDIATELY", false),
            },
        }
    }
}

/// Reference move server settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Total wall-clock time a game may last
    pub max_game_minutes: u64,
    /// Per-move limit used to flag slow moves in the post-game report
    pub max_move_seconds: u64,
    /// Prefix of the post-game page; the game id is appended
    pub redirect_base: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_game_minutes: 20,
            max_move_seconds: 30,
            redirect_base: "/result".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ServerConfig::default();
        ServerConfig {
            host: lookup("CHESS_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "CHESS_PORT", defaults.port),
            max_game_minutes: parse_or(&lookup, "CHESS_MAX_GAME_MINUTES", defaults.max_game_minutes),
            max_move_seconds: parse_or(&lookup, "CHESS_MAX_MOVE_SECONDS", defaults.max_move_seconds),
            redirect_base: lookup("CHESS_REDIRECT_BASE").unwrap_or(defaults.redirect_base),
        }
    }

    pub fn max_game_time(&self) -> Duration {
        Duration::from_secs(self.max_game_minutes * 60)
    }

    pub fn max_move_time(&self) -> Duration {
        Duration::from_secs(self.max_move_seconds)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring {}={:?}: {}", key, raw, e);
                default
            }
        },
        None => default,
    }
}
