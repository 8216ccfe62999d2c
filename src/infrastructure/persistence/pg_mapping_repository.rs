//! PostgreSQL implementation of the mapping repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Mapping, MappingStatus, NewMapping};
use crate::domain::repositories::{CodeStream, MappingRepository, StoreError};

/// Rows fetched per page by [`MappingRepository::list_active_expired`].
const EXPIRED_PAGE_SIZE: i64 = 500;

const MAPPING_COLUMNS: &str =
    "code, destination, content_hash, created_at, expire_at, status, visits, owner_id";

#[derive(Debug, FromRow)]
struct MappingRow {
    code: String,
    destination: String,
    content_hash: Option<String>,
    created_at: DateTime<Utc>,
    expire_at: Option<DateTime<Utc>>,
    status: String,
    visits: i64,
    owner_id: Option<String>,
}

impl TryFrom<MappingRow> for Mapping {
    type Error = StoreError;

    fn try_from(row: MappingRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<MappingStatus>()
            .map_err(StoreError::Unavailable)?;

        Ok(Mapping {
            code: row.code,
            destination: row.destination,
            content_hash: row.content_hash,
            created_at: row.created_at,
            expire_at: row.expire_at,
            status,
            visits: row.visits,
            owner_id: row.owner_id,
        })
    }
}

/// PostgreSQL repository for the `mappings` table.
///
/// Status changes are conditional updates, so concurrent writers on the same
/// row serialize in the database and at most one of them sees a row change.
pub struct PgMappingRepository {
    pool: Arc<PgPool>,
}

impl PgMappingRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch_one_page(
        pool: &PgPool,
        now: DateTime<Utc>,
        after: &str,
    ) -> Result<Vec<String>, StoreError> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT code
            FROM mappings
            WHERE status = 'active' AND expire_at <= $1 AND code > $2
            ORDER BY code
            LIMIT $3
            "#,
        )
        .bind(now)
        .bind(after)
        .bind(EXPIRED_PAGE_SIZE)
        .fetch_all(pool)
        .await?;

        Ok(codes)
    }
}

#[async_trait]
impl MappingRepository for PgMappingRepository {
    async fn exists(&self, code: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM mappings WHERE code = $1)",
        )
        .bind(code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(exists)
    }

    async fn find_by_code(
        &self,
        code: &str,
        active_only: bool,
    ) -> Result<Option<Mapping>, StoreError> {
        let sql = format!(
            "SELECT {MAPPING_COLUMNS} FROM mappings \
             WHERE code = $1 AND (NOT $2 OR status = 'active') LIMIT 1"
        );

        sqlx::query_as::<_, MappingRow>(&sql)
            .bind(code)
            .bind(active_only)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Mapping::try_from)
            .transpose()
    }

    async fn find_active_by_content_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<Mapping>, StoreError> {
        let sql = format!(
            "SELECT {MAPPING_COLUMNS} FROM mappings \
             WHERE content_hash = $1 AND status = 'active' LIMIT 1"
        );

        sqlx::query_as::<_, MappingRow>(&sql)
            .bind(content_hash)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Mapping::try_from)
            .transpose()
    }

    async fn create(&self, new_mapping: NewMapping) -> Result<Mapping, StoreError> {
        let sql = format!(
            "INSERT INTO mappings (code, destination, content_hash, created_at, expire_at, status, visits, owner_id) \
             VALUES ($1, $2, $3, $4, $5, 'active', 0, $6) \
             RETURNING {MAPPING_COLUMNS}"
        );

        let inserted = sqlx::query_as::<_, MappingRow>(&sql)
            .bind(&new_mapping.code)
            .bind(&new_mapping.destination)
            .bind(&new_mapping.content_hash)
            .bind(new_mapping.created_at)
            .bind(new_mapping.expire_at)
            .bind(&new_mapping.owner_id)
            .fetch_one(self.pool.as_ref())
            .await;

        match inserted.map_err(StoreError::from) {
            Ok(row) => Mapping::try_from(row),
            Err(StoreError::DuplicateCode(_)) => Err(StoreError::DuplicateCode(new_mapping.code)),
            Err(StoreError::DuplicateContent { .. }) => {
                let existing_code = match &new_mapping.content_hash {
                    Some(hash) => self
                        .find_active_by_content_hash(hash)
                        .await?
                        .map(|m| m.code)
                        .unwrap_or_default(),
                    None => String::new(),
                };
                Err(StoreError::DuplicateContent { existing_code })
            }
            Err(e) => Err(e),
        }
    }

    async fn increment_visits(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE mappings SET visits = visits + 1 WHERE code = $1")
            .bind(code)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_blocked(&self, code: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE mappings SET status = 'blocked' WHERE code = $1 AND status = 'active'",
        )
        .bind(code)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    fn list_active_expired(&self, now: DateTime<Utc>) -> CodeStream {
        let pool = self.pool.clone();

        // Keyset pagination on `code`: rows blocked between pages drop out of
        // the filter without shifting the cursor.
        stream::try_unfold(Some(String::new()), move |cursor| {
            let pool = pool.clone();
            async move {
                let Some(after) = cursor else {
                    return Ok(None);
                };

                let page = Self::fetch_one_page(&pool, now, &after).await?;
                if page.is_empty() {
                    return Ok(None);
                }

                let next = if (page.len() as i64) < EXPIRED_PAGE_SIZE {
                    None
                } else {
                    page.last().cloned()
                };

                let codes = stream::iter(page.into_iter().map(Ok::<String, StoreError>));
                Ok::<_, StoreError>(Some((codes, next)))
            }
        })
        .try_flatten()
        .boxed()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
