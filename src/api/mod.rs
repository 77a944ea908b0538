pub mod client;
pub mod cookies;
pub mod service;

pub use client::{method_carries_body, Api, ApiResponse, Method};
pub use cookies::{get_cookie, CookieJar};
pub use service::{move_path, MoveService};
