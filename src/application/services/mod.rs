//! Business logic services for the application layer.

pub mod allocator;
pub mod mapping_service;
pub mod resolver;
pub mod route_conflict;
pub mod sweeper;

pub use allocator::{AllocationError, AllocatorSettings, CodeAllocator};
pub use mapping_service::{CreateMapping, CreatedMapping, CreationSettings, MappingService};
pub use resolver::{Action, RedirectResolver, ResolverSettings};
pub use route_conflict::RouteConflictChecker;
pub use sweeper::{ExpirationSweeper, run_sweep_scheduler};
