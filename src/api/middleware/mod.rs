//! HTTP middleware for request processing.
//!
//! Provides short-code redirection and observability middleware.

pub mod redirect;
pub mod tracing;
