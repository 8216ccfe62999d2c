//! Utility functions shared across layers.
//!
//! - [`destination`] - Destination URL validation, normalization and hashing

pub mod destination;
