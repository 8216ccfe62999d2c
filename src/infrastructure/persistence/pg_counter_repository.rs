//! PostgreSQL implementation of the allocation counter.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::repositories::{CounterRepository, StoreError};

/// Counters stored as rows of `allocation_counters`.
///
/// The increment is a single upsert statement, so it is atomic across
/// connections and across processes sharing the database.
pub struct PgCounterRepository {
    pool: Arc<PgPool>,
}

impl PgCounterRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterRepository for PgCounterRepository {
    async fn next_value(&self, name: &str, start: i64) -> Result<i64, StoreError> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO allocation_counters (name, value)
            VALUES ($1, $2 + 1)
            ON CONFLICT (name) DO UPDATE
                SET value = allocation_counters.value + 1
            RETURNING value
            "#,
        )
        .bind(name)
        .bind(start)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(value)
    }

    async fn current_value(&self, name: &str) -> Result<Option<i64>, StoreError> {
        let value = sqlx::query_scalar::<_, i64>(
            "SELECT value FROM allocation_counters WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(value)
    }
}
