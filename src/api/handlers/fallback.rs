//! Fallback for paths no route or live mapping claims.

use axum::http::Uri;
use serde_json::json;

use crate::error::AppError;

/// JSON 404 for unknown paths, including unknown, blocked and expired codes.
pub async fn fallback_handler(uri: Uri) -> AppError {
    AppError::not_found("Not found", json!({ "path": uri.path() }))
}
