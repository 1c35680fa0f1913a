//! The Nariz Encantado API's endpoints.
//!
//! Each function maps to exactly one HTTP request. Nothing is retried or
//! cached, so callers decide what to do with an [`ApiError`](crate::ApiError).

pub mod admin;
pub mod auth;
pub mod events;
pub mod financial;
mod upload;
pub mod users;

pub use auth::LoginResponse;
pub use upload::Upload;

use serde_derive::Serialize;

/// Paging parameters understood by the list endpoints.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    pub const fn new(skip: u32, limit: u32) -> Self { Page { skip, limit } }
}

impl Default for Page {
    fn default() -> Self { Page::new(0, 100) }
}
