//! Application layer services implementing business logic.
//!
//! Services coordinate repository calls and domain rules. They are generic
//! over the repository traits so that handlers can run them against
//! PostgreSQL, the in-memory store, or `mockall` mocks.
//!
//! # Available Services
//!
//! - [`services::allocator::CodeAllocator`] - Counter-driven short-code allocation
//! - [`services::route_conflict::RouteConflictChecker`] - Reserved-path detection
//! - [`services::resolver::RedirectResolver`] - Per-request resolution and lazy expiration
//! - [`services::sweeper::ExpirationSweeper`] - Batch blocking of expired mappings
//! - [`services::mapping_service::MappingService`] - Creation workflow

pub mod services;
