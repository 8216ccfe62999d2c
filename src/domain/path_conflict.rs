//! Port for detecting collisions between short codes and host routes.

use crate::domain::repositories::StoreError;
use async_trait::async_trait;

/// Decides whether a candidate code would shadow a path the host serves.
///
/// A code is reserved when it equals an enabled language prefix, resolves to
/// a registered path alias, or matches any other routable path. The
/// allocator never hands out a reserved code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PathConflictChecker: Send + Sync {
    async fn is_reserved(&self, candidate: &str) -> Result<bool, StoreError>;
}
