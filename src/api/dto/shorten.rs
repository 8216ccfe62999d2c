//! DTOs for the link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use validator::Validate;

/// Request to shorten one destination.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    /// The destination URL (must be absolute HTTP/HTTPS).
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub url: String,

    /// Relative expiration in whole days.
    #[validate(range(min = 1, max = 3650, message = "must be between 1 and 3650 days"))]
    pub expires_in_days: Option<i64>,

    /// Absolute expiration. Mutually exclusive with `expires_in_days`.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Created mapping as returned to the client.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
    pub destination: String,
    pub expires_at: Option<DateTime<Utc>>,
}
