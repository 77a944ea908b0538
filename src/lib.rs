//! Client side of an online chess game: a move-submission state machine that
//! keeps a board widget in step with a rules model and a remote move service,
//! the turn and redirect countdowns, and a reference move server.

pub mod api;
pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod session;
pub mod ui;

pub use config::{ClientConfig, ServerConfig, SessionConfig};
pub use error::{ApiError, MoveError, RulesError, ServerError};
pub use session::{GameSession, Phase, Settlement, SnapbackReason};
