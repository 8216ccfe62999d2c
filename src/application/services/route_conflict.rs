//! Reserved-path detection for short-code candidates.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::path_conflict::PathConflictChecker;
use crate::domain::repositories::{AliasRepository, StoreError};

/// First path segments the service itself routes.
pub const SYSTEM_ROUTES: &[&str] = &["api", "health"];

/// [`PathConflictChecker`] backed by the host's language prefixes, its own
/// routes, and the registered path aliases.
pub struct RouteConflictChecker<A: AliasRepository + ?Sized> {
    languages: HashSet<String>,
    routes: HashSet<String>,
    aliases: Arc<A>,
}

impl<A: AliasRepository + ?Sized> RouteConflictChecker<A> {
    /// Builds a checker. [`SYSTEM_ROUTES`] are always reserved in addition to
    /// `extra_routes`.
    pub fn new<L, R>(languages: L, extra_routes: R, aliases: Arc<A>) -> Self
    where
        L: IntoIterator,
        L::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let routes = SYSTEM_ROUTES
            .iter()
            .map(|r| r.to_string())
            .chain(extra_routes.into_iter().map(Into::into))
            .map(|r| r.trim_matches('/').to_string())
            .filter(|r| !r.is_empty())
            .collect();

        Self {
            languages: languages.into_iter().map(Into::into).collect(),
            routes,
            aliases,
        }
    }
}

#[async_trait]
impl<A: AliasRepository + ?Sized> PathConflictChecker for RouteConflictChecker<A> {
    async fn is_reserved(&self, candidate: &str) -> Result<bool, StoreError> {
        if self.languages.contains(candidate) || self.routes.contains(candidate) {
            return Ok(true);
        }

        Ok(self.aliases.resolve(candidate).await?.is_some())
    }
}
