//! Domain layer containing business entities and logic.
//!
//! Everything here is independent of HTTP and of the concrete database.
//!
//! # Architecture
//!
//! - [`entities`] - The [`entities::Mapping`] record and its status
//! - [`alphabet`] - Positional codec that turns counter values into codes
//! - [`short_code`] - Request path normalization and code validation
//! - [`repositories`] - Data access trait definitions
//! - [`path_conflict`] - Port for reserved host paths
//! - [`visit_event`] / [`visit_worker`] - Asynchronous visit counting
//!
//! # Redirect Flow
//!
//! 1. The redirect middleware normalizes the request path with [`short_code`]
//! 2. [`crate::application::services::RedirectResolver`] looks the code up
//! 3. On a redirect, a [`visit_event::VisitEvent`] is queued without waiting
//! 4. [`visit_worker::run_visit_worker`] applies the increment later

pub mod alphabet;
pub mod entities;
pub mod path_conflict;
pub mod repositories;
pub mod short_code;
pub mod visit_event;
pub mod visit_worker;
