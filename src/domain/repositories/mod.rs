//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the persistence engine behind the contracts the core
//! relies on. They are implemented in `crate::infrastructure::persistence`.
//!
//! # Available Repositories
//!
//! - [`MappingRepository`] - Short-code mappings, status and visit counters
//! - [`CounterRepository`] - Persisted monotonic allocation counter
//! - [`AliasRepository`] - Host path aliases that codes must not shadow
//!
//! # Testing
//!
//! Mock implementations are generated with `mockall` under `cfg(test)`.
//! See integration tests in `tests/repository_*.rs` for PostgreSQL usage.

pub mod alias_repository;
pub mod counter_repository;
pub mod mapping_repository;
pub mod store_error;

pub use alias_repository::{AliasRepository, PathAlias};
pub use counter_repository::{CounterRepository, SHORT_CODE_COUNTER};
pub use mapping_repository::{CodeStream, MappingRepository};
pub use store_error::StoreError;

#[cfg(test)]
pub use alias_repository::MockAliasRepository;
#[cfg(test)]
pub use counter_repository::MockCounterRepository;
#[cfg(test)]
pub use mapping_repository::MockMappingRepository;
