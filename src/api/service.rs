use futures::future::{FutureExt, LocalBoxFuture};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::api::client::{Api, ApiResponse};
use crate::error::ApiError;
use crate::models::{MoveRequest, MoveResult};

// Characters that cannot appear raw inside one path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

/// The remote side of a move exchange
pub trait MoveService {
    /// Opaque session token, read fresh for every submission
    fn session_token(&self) -> String;

    fn submit_move<'a>(
        &'a self,
        token: &'a str,
        request: &'a MoveRequest,
    ) -> LocalBoxFuture<'a, Result<MoveResult, ApiError>>;
}

/// `/move/{token}` with the token encoded as a single path segment
pub fn move_path(token: &str) -> String {
    format!("/move/{}", utf8_percent_encode(token, SEGMENT))
}

impl MoveService for Api {
    fn session_token(&self) -> String {
        self.get_cookie(self.token_cookie())
    }

    fn submit_move<'a>(
        &'a self,
        token: &'a str,
        request: &'a MoveRequest,
    ) -> LocalBoxFuture<'a, Result<MoveResult, ApiError>> {
        async move {
            match self.put(&move_path(token), request, false).await? {
                ApiResponse::Json(value) => Ok(serde_json::from_value(value)?),
                ApiResponse::Text(body) => Err(ApiError::UnexpectedBody(body)),
                ApiResponse::Success(_) => Err(ApiError::UnexpectedBody(String::new())),
            }
        }
        .boxed_local()
    }
}
