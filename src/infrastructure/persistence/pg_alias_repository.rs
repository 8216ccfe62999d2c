//! PostgreSQL implementation of the path alias lookup.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::repositories::{AliasRepository, PathAlias, StoreError};

#[derive(Debug, FromRow)]
struct AliasRow {
    alias: String,
    target: String,
}

/// Aliases stored in `path_aliases`, keyed without the leading slash.
pub struct PgAliasRepository {
    pool: Arc<PgPool>,
}

impl PgAliasRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AliasRepository for PgAliasRepository {
    async fn resolve(&self, path: &str) -> Result<Option<String>, StoreError> {
        let target = sqlx::query_scalar::<_, String>(
            "SELECT target FROM path_aliases WHERE alias = $1",
        )
        .bind(path.trim_matches('/'))
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(target)
    }

    async fn upsert(&self, alias: PathAlias) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO path_aliases (alias, target)
            VALUES ($1, $2)
            ON CONFLICT (alias) DO UPDATE SET target = EXCLUDED.target
            "#,
        )
        .bind(alias.alias.trim_matches('/'))
        .bind(&alias.target)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<PathAlias>, StoreError> {
        let rows = sqlx::query_as::<_, AliasRow>(
            "SELECT alias, target FROM path_aliases ORDER BY alias",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PathAlias {
                alias: r.alias,
                target: r.target,
            })
            .collect())
    }
}
