//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET|HEAD /{code}`    - Short link redirect (redirect middleware)
//! - `GET  /health`        - Health check: database, visit queue
//! - `POST /api/shorten`   - Create a short URL
//! - anything else         - JSON 404
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging (outermost)
//! - **Redirect** - Answers live short codes before the matched handler runs

use crate::api;
use crate::api::handlers::{fallback_handler, health_handler};
use crate::api::middleware::{redirect, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api::routes::api_routes())
        .fallback(fallback_handler)
        .layer(middleware::from_fn_with_state(state.clone(), redirect::layer))
        .layer(tracing::layer())
        .with_state(state)
}
