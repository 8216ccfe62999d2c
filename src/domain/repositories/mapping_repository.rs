//! Repository trait for mapping data access.

use crate::domain::entities::{Mapping, NewMapping};
use crate::domain::repositories::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;

/// Lazy, finite, single-pass sequence of codes produced by
/// [`MappingRepository::list_active_expired`].
pub type CodeStream = BoxStream<'static, Result<String, StoreError>>;

/// Repository interface for the mapping table.
///
/// Status changes go through [`Self::set_blocked`] only; there is no general
/// status setter.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgMappingRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryMappingRepository`] - in-process, for tests
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_mapping.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Returns true if any mapping, active or blocked, uses `code`.
    async fn exists(&self, code: &str) -> Result<bool, StoreError>;

    /// Finds a mapping by code, optionally restricted to `Active` ones.
    async fn find_by_code(&self, code: &str, active_only: bool)
    -> Result<Option<Mapping>, StoreError>;

    /// Finds the live mapping whose destination hashes to `content_hash`.
    async fn find_active_by_content_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<Mapping>, StoreError>;

    /// Inserts a new mapping.
    ///
    /// # Errors
    ///
    /// - [`StoreError::DuplicateCode`] if the code is taken
    /// - [`StoreError::DuplicateContent`] if a live mapping has the same content hash
    /// - [`StoreError::Unavailable`] on database errors
    async fn create(&self, new_mapping: NewMapping) -> Result<Mapping, StoreError>;

    /// Adds one to the visit counter.
    ///
    /// Returns `Ok(false)` if the mapping no longer exists.
    async fn increment_visits(&self, code: &str) -> Result<bool, StoreError>;

    /// Moves an `Active` mapping to `Blocked`.
    ///
    /// Returns `Ok(true)` only if this call performed the transition; a
    /// mapping that is already blocked or missing yields `Ok(false)`.
    async fn set_blocked(&self, code: &str) -> Result<bool, StoreError>;

    /// Streams the codes of `Active` mappings with `expire_at <= now`.
    fn list_active_expired(&self, now: DateTime<Utc>) -> CodeStream;

    /// Connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
