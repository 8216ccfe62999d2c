//! Repository trait for host path aliases.

use crate::domain::repositories::StoreError;
use async_trait::async_trait;

/// A path alias registered by the host system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAlias {
    pub alias: String,
    pub target: String,
}

/// Lookup of host path aliases, consulted during code allocation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AliasRepository: Send + Sync {
    /// Returns the alias target if `path` is a registered alias.
    async fn resolve(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Registers or replaces an alias.
    async fn upsert(&self, alias: PathAlias) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<PathAlias>, StoreError>;
}
