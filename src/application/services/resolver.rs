//! Per-request redirect resolution and lazy expiration.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::domain::repositories::MappingRepository;
use crate::domain::short_code::normalize_request_path;

/// What the inbound request should do after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Not a live mapping; let normal routing handle the request.
    NoAction,
    /// Redirect to `destination`, then count a visit for `code`.
    Redirect { code: String, destination: String },
}

/// Default limit on each store call made while resolving a request.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Resolver parameters taken from configuration.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Upper bound on one store call; a slower call counts as a failure.
    pub store_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_RESOLVE_TIMEOUT,
        }
    }
}

/// Resolves request paths against the mapping store.
///
/// Per mapping, the resolver observes:
///
/// - `Active`, not expired: redirect, no state change
/// - `Active`, expired: block it once, then fall through
/// - `Blocked`: always fall through
///
/// Store failures and store calls exceeding
/// [`ResolverSettings::store_timeout`] fail open to [`Action::NoAction`]; a
/// lookup is never retried within one resolution.
pub struct RedirectResolver<M: MappingRepository + ?Sized> {
    store: Arc<M>,
    settings: ResolverSettings,
}

impl<M: MappingRepository + ?Sized> RedirectResolver<M> {
    pub fn new(store: Arc<M>) -> Self {
        Self::with_settings(store, ResolverSettings::default())
    }

    pub fn with_settings(store: Arc<M>, settings: ResolverSettings) -> Self {
        Self { store, settings }
    }

    /// Resolves `request_path` at the current time.
    pub async fn resolve(&self, request_path: &str) -> Action {
        self.resolve_at(request_path, Utc::now()).await
    }

    /// Resolves `request_path` as of `now`.
    pub async fn resolve_at(&self, request_path: &str, now: DateTime<Utc>) -> Action {
        let Some(code) = normalize_request_path(request_path) else {
            return Action::NoAction;
        };

        let lookup = timeout(
            self.settings.store_timeout,
            self.store.find_by_code(&code, true),
        );
        let mapping = match lookup.await {
            Ok(Ok(Some(mapping))) if mapping.is_active() => mapping,
            Ok(Ok(_)) => {
                debug!(%code, "No active mapping");
                return Action::NoAction;
            }
            Ok(Err(e)) => {
                warn!(%code, error = %e, "Mapping lookup failed, falling through");
                return Action::NoAction;
            }
            Err(_) => {
                warn!(%code, "Mapping lookup timed out, falling through");
                counter!("resolver_store_timeouts_total", "op" => "lookup").increment(1);
                return Action::NoAction;
            }
        };

        if !mapping.is_expired_at(now) {
            counter!("redirects_total").increment(1);
            return Action::Redirect {
                code,
                destination: mapping.destination,
            };
        }

        match timeout(self.settings.store_timeout, self.store.set_blocked(&code)).await {
            Ok(Ok(true)) => {
                info!(%code, "Blocked expired mapping on access");
                counter!("mappings_blocked_total", "source" => "resolver").increment(1);
            }
            Ok(Ok(false)) => debug!(%code, "Expired mapping was already blocked"),
            Ok(Err(e)) => warn!(%code, error = %e, "Failed to block expired mapping"),
            Err(_) => {
                // The sweeper retires it later.
                warn!(%code, "Blocking expired mapping timed out");
                counter!("resolver_store_timeouts_total", "op" => "block").increment(1);
            }
        }

        Action::NoAction
    }
}
