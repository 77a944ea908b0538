use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::messages::MoveResult;

/// Failures of the HTTP transport.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a failure status and a body that is not JSON.
    #[error("Server responds with error: {status}")]
    Status { status: u16 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A successful response carried plain text where JSON was expected.
    #[error("unexpected non-JSON response body: {0}")]
    UnexpectedBody(String),

    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failures the move-submission state machine hands back to its host.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("move submission failed: {0}")]
    Transport(#[from] ApiError),
}

/// Failures of the rules model.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("invalid piece code: {0}")]
    InvalidPiece(String),
}

/// Failures of the move server's HTTP handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The token never existed or its game is over
    #[error("no game for token {0}")]
    UnknownToken(String),

    #[error("no finished game {0}")]
    UnknownGame(u64),

    #[error("Missing data!")]
    MissingData,

    #[error("invalid user elo: {0}")]
    InvalidElo(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::UnknownToken(_) | ServerError::UnknownGame(_) => StatusCode::NOT_FOUND,
            ServerError::MissingData => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::InvalidElo(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServerError::MissingData => {
                HttpResponse::build(self.status_code()).json(MoveResult::rejected(self.to_string()))
            }
            _ => HttpResponse::build(self.status_code()).body(self.to_string()),
        }
    }
}
