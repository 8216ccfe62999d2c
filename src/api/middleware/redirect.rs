//! Redirect middleware: serves live short codes before any handler runs.

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::stream;
use metrics::counter;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::application::services::Action;
use crate::domain::visit_event::VisitEvent;
use crate::state::AppState;

/// Resolves `GET`/`HEAD` request paths against the mapping store.
///
/// # Request Flow
///
/// 1. Non-`GET`/`HEAD` requests go straight to the router
/// 2. [`crate::application::services::RedirectResolver`] resolves the path
/// 3. On a redirect, respond `307 Temporary Redirect` and queue a visit
/// 4. Anything else (unknown, blocked, expired, store down) continues to
///    the router unchanged
///
/// # Visit Tracking
///
/// The visit is queued with `try_send` only once the (empty) response body
/// has been written or dropped, so the worker never counts a visit before
/// the redirect is sent. If the queue is full the visit is dropped.
///
/// # Usage
///
/// ```rust,ignore
/// let app = Router::new()
///     .route("/health", get(health_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), redirect::layer))
///     .with_state(state);
/// ```
pub async fn layer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return next.run(request).await;
    }

    let Action::Redirect { code, destination } =
        state.resolver.resolve(request.uri().path()).await
    else {
        return next.run(request).await;
    };

    let Some(location) = location_header(&destination) else {
        warn!(%code, "Destination is not a valid Location header, falling through");
        return next.run(request).await;
    };

    let visit = PendingVisit::new(state.visit_sender.clone(), VisitEvent::new(code));

    (
        StatusCode::TEMPORARY_REDIRECT,
        [(header::LOCATION, location)],
        redirect_body(visit),
    )
        .into_response()
}

/// A visit that is queued when this value is dropped.
struct PendingVisit {
    sender: mpsc::Sender<VisitEvent>,
    event: Option<VisitEvent>,
}

impl PendingVisit {
    fn new(sender: mpsc::Sender<VisitEvent>, event: VisitEvent) -> Self {
        Self {
            sender,
            event: Some(event),
        }
    }
}

impl Drop for PendingVisit {
    fn drop(&mut self) {
        let Some(event) = self.event.take() else {
            return;
        };
        let code = event.code.clone();

        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                counter!("visits_dropped_total").increment(1);
                debug!(%code, "Visit queue full, visit dropped");
            }
            Err(TrySendError::Closed(_)) => warn!(%code, "Visit queue closed, visit dropped"),
        }
    }
}

/// Empty body that releases `visit` when the server finishes with it.
fn redirect_body(visit: PendingVisit) -> Body {
    Body::from_stream(stream::unfold(visit, |visit| async move {
        drop(visit);
        None::<(Result<Bytes, Infallible>, PendingVisit)>
    }))
}

/// Builds the `Location` value, stripping CR and LF first.
fn location_header(destination: &str) -> Option<HeaderValue> {
    let cleaned: String = destination
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();

    HeaderValue::from_str(&cleaned).ok()
}
