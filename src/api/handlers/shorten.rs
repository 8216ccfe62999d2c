//! Handler for the link shortening endpoint.

use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use serde_json::json;
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::application::services::CreateMapping;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short URL for one destination.
///
/// # Endpoint
///
/// `POST /api/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "expires_in_days": 30
/// }
/// ```
///
/// `expires_at` (RFC 3339) may be given instead of `expires_in_days`.
///
/// # Response
///
/// `201 Created`
///
/// ```json
/// {
///   "code": "x7K",
///   "short_url": "https://s.example.com/x7K",
///   "destination": "https://example.com/some/long/path",
///   "expires_at": "2026-11-16T10:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - 400 if validation fails or the URL is not an http(s) URL
/// - 409 if the destination already has a live short URL
/// - 500 if allocation or the database fails
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<(StatusCode, Json<ShortenResponse>), AppError> {
    payload.validate()?;

    let now = Utc::now();
    let expire_at = match (payload.expires_in_days, payload.expires_at) {
        (Some(_), Some(_)) => {
            return Err(AppError::bad_request(
                "Use either expires_in_days or expires_at, not both",
                json!({}),
            ));
        }
        (Some(days), None) => Some(now + Duration::days(days)),
        (None, at) => at,
    };

    let created = state
        .mapping_service
        .create_mapping_at(
            CreateMapping {
                destination: payload.url,
                expire_at,
                owner_id: None,
            },
            now,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ShortenResponse {
            code: created.mapping.code,
            short_url: created.short_url,
            destination: created.mapping.destination,
            expires_at: created.mapping.expire_at,
        }),
    ))
}
