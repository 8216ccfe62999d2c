//! Repository implementations.
//!
//! PostgreSQL repositories use SQLx runtime queries mapped through `FromRow`
//! rows. The in-memory repositories share the same contracts and back the
//! HTTP tests.
//!
//! # Repositories
//!
//! - [`PgMappingRepository`] - Mapping storage, status transitions, expired listing
//! - [`PgCounterRepository`] - Atomic allocation counter
//! - [`PgAliasRepository`] - Host path aliases
//! - [`MemoryMappingRepository`], [`MemoryCounterRepository`], [`MemoryAliasRepository`]

pub mod memory;
pub mod pg_alias_repository;
pub mod pg_counter_repository;
pub mod pg_mapping_repository;

pub use memory::{MemoryAliasRepository, MemoryCounterRepository, MemoryMappingRepository};
pub use pg_alias_repository::PgAliasRepository;
pub use pg_counter_repository::PgCounterRepository;
pub use pg_mapping_repository::PgMappingRepository;
