//! Core domain entities representing the business data model.
//!
//! Entities are plain data structures with explicit types; the only behavior
//! they carry is the derived expiration predicate and the one-way status
//! transition.
//!
//! # Entity Types
//!
//! - [`Mapping`] - A short code bound to a destination URL
//! - [`MappingStatus`] - Whether the mapping still serves redirects
//!
//! Creation goes through [`NewMapping`], which carries only the fields the
//! creation workflow decides; counters and status start at their defaults.

pub mod mapping;

pub use mapping::{Mapping, MappingStatus, NewMapping};
