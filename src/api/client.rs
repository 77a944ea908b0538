use log::{debug, info};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;

use crate::api::cookies::CookieJar;
use crate::error::ApiError;
use crate::models::GameInfo;

/// Method names that send a JSON body
const BODY_METHODS: [&str; 4] = ["WRITE", "UPDATE", "POST", "PUT"];

/// Request kinds understood by the move service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Read,
    Write,
    Update,
    Delete,
}

impl Method {
    pub fn carries_body(self) -> bool {
        method_carries_body(self.as_http())
    }

    pub fn as_http(self) -> &'static str {
        match self {
            Method::Read => "GET",
            Method::Write => "POST",
            Method::Update => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Read => reqwest::Method::GET,
            Method::Write => reqwest::Method::POST,
            Method::Update => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_http())
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "READ" | "GET" => Ok(Method::Read),
            "WRITE" | "POST" => Ok(Method::Write),
            "UPDATE" | "PUT" => Ok(Method::Update),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported method: {}", other)),
        }
    }
}

/// Whether a request made with the named method sends a JSON body
pub fn method_carries_body(name: &str) -> bool {
    let name = name.to_ascii_uppercase();
    BODY_METHODS.contains(&name.as_str())
}

/// What a request produced
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Only the success flag was requested
    Success(bool),
    Json(Value),
    /// Non-JSON body of a successful response
    Text(String),
}

/// HTTP client for the move service
pub struct Api {
    client: Client,
    base_url: Url,
    token_cookie: String,
    cookies: RefCell<CookieJar>,
}

impl Api {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder().build()?;

        Ok(Api {
            client,
            base_url,
            token_cookie: "token".to_string(),
            cookies: RefCell::new(CookieJar::new()),
        })
    }

    pub fn with_cookies(self, cookies: CookieJar) -> Self {
        self.cookies.replace(cookies);
        self
    }

    /// Name of the cookie holding the session token
    pub fn with_token_cookie(mut self, name: impl Into<String>) -> Self {
        self.token_cookie = name.into();
        self
    }

    pub fn token_cookie(&self) -> &str {
        &self.token_cookie
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Issue one request.
    ///
    /// Body-carrying methods send `{"data": payload}`. With
    /// `return_only_success` the result is just `status < 400`; otherwise a
    /// JSON body is returned whatever the status, a non-JSON body only when
    /// the status indicates success.
    pub async fn send_request<T>(
        &self,
        path: &str,
        payload: Option<&T>,
        method: Method,
        return_only_success: bool,
    ) -> Result<ApiResponse, ApiError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url(path)?;
        info!("{} {}", method, url);

        let mut request = self.client.request(method.to_reqwest(), url);

        {
            let jar = self.cookies.borrow();
            if !jar.is_empty() {
                request = request.header(COOKIE, jar.header_value());
            }
        }

        if method.carries_body() {
            let data = match payload {
                Some(payload) => serde_json::to_value(payload)?,
                None => json!({}),
            };
            request = request.json(&json!({ "data": data }));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();

        for header in response.headers().get_all(SET_COOKIE) {
            if let Ok(value) = header.to_str() {
                self.cookies.borrow_mut().store_set_cookie(value);
            }
        }

        if return_only_success {
            return Ok(ApiResponse::Success(status < 400));
        }

        let body = response.text().await?;
        debug!("Response {}: {}", status, body);

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Ok(ApiResponse::Json(value)),
            Err(_) if status < 400 => Ok(ApiResponse::Text(body)),
            Err(_) => Err(ApiError::Status { status }),
        }
    }

    pub async fn get(&self, path: &str, return_only_success: bool) -> Result<ApiResponse, ApiError> {
        self.send_request::<Value>(path, None, Method::Read, return_only_success)
            .await
    }

    pub async fn put<T>(&self, path: &str, data: &T, return_only_success: bool) -> Result<ApiResponse, ApiError>
    where
        T: Serialize + ?Sized,
    {
        self.send_request(path, Some(data), Method::Update, return_only_success)
            .await
    }

    /// Load the game page data, picking up the session cookie on the way
    pub async fn fetch_game(&self, path: &str) -> Result<GameInfo, ApiError> {
        match self.get(path, false).await? {
            ApiResponse::Json(value) => Ok(serde_json::from_value(value)?),
            ApiResponse::Text(body) => Err(ApiError::UnexpectedBody(body)),
            ApiResponse::Success(_) => Err(ApiError::UnexpectedBody(String::new())),
        }
    }

    /// Value of the named cookie as last set by the server or seeded at startup
    pub fn get_cookie(&self, name: &str) -> String {
        self.cookies.borrow().get_cookie(name)
    }
}
