//! Repository trait for persisted monotonic counters.

use crate::domain::repositories::StoreError;
use async_trait::async_trait;

/// Name of the counter that drives short-code allocation.
pub const SHORT_CODE_COUNTER: &str = "short_code";

/// Persisted counters with an indivisible increment-and-read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterRepository: Send + Sync {
    /// Atomically adds one to counter `name` and returns the new value.
    ///
    /// A counter that does not exist yet is created at `start`, so the first
    /// call returns `start + 1`. Two concurrent callers never observe the
    /// same value.
    async fn next_value(&self, name: &str, start: i64) -> Result<i64, StoreError>;

    /// Reads the current value without changing it.
    async fn current_value(&self, name: &str) -> Result<Option<i64>, StoreError>;
}
