//! Visit event model for asynchronous visit counting.

use chrono::{DateTime, Utc};

/// A successful redirect waiting to be counted.
///
/// Redirect handling pushes these onto a channel so the response never waits
/// for the counter write; [`crate::domain::visit_worker::run_visit_worker`]
/// drains the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitEvent {
    pub code: String,
    pub visited_at: DateTime<Utc>,
}

impl VisitEvent {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            visited_at: Utc::now(),
        }
    }
}
