//! HTTP handlers for the explorer API
//!
//! Successful responses are the raw JSON documents; client errors use the
//! [`ApiResponse`](crate::models::ApiResponse) envelope through [`ApiError`].

use axum::http::Uri;

use crate::error::ApiError;

pub mod chain;
pub mod hotspots;
pub mod search;
pub mod stats;
pub mod validators;
pub mod wallets;

pub use chain::*;
pub use hotspots::*;
pub use search::*;
pub use stats::*;
pub use validators::*;
pub use wallets::*;

pub const BANNER: &str = "Coverage Explorer API V1";

pub async fn root() -> &'static str {
    BANNER
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
