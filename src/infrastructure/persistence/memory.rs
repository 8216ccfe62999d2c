//! In-process repositories with the same contracts as the PostgreSQL ones.
//!
//! Used by the HTTP integration tests and for running the service without a
//! database. Nothing here survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::domain::entities::{Mapping, MappingStatus, NewMapping};
use crate::domain::repositories::{
    AliasRepository, CodeStream, CounterRepository, MappingRepository, PathAlias, StoreError,
};

/// Mappings kept in a sorted map keyed by code.
#[derive(Default, Clone)]
pub struct MemoryMappingRepository {
    rows: Arc<RwLock<BTreeMap<String, Mapping>>>,
}

impl MemoryMappingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a mapping as-is, bypassing every check. Test setup only.
    pub async fn insert_raw(&self, mapping: Mapping) {
        self.rows.write().await.insert(mapping.code.clone(), mapping);
    }
}

#[async_trait]
impl MappingRepository for MemoryMappingRepository {
    async fn exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self.rows.read().await.contains_key(code))
    }

    async fn find_by_code(
        &self,
        code: &str,
        active_only: bool,
    ) -> Result<Option<Mapping>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(code)
            .filter(|m| !active_only || m.is_active())
            .cloned())
    }

    async fn find_active_by_content_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<Mapping>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .find(|m| m.is_active() && m.content_hash.as_deref() == Some(content_hash))
            .cloned())
    }

    async fn create(&self, new_mapping: NewMapping) -> Result<Mapping, StoreError> {
        let mut rows = self.rows.write().await;

        if rows.contains_key(&new_mapping.code) {
            return Err(StoreError::DuplicateCode(new_mapping.code));
        }

        if let Some(hash) = new_mapping.content_hash.as_deref()
            && let Some(existing) = rows
                .values()
                .find(|m| m.is_active() && m.content_hash.as_deref() == Some(hash))
        {
            return Err(StoreError::DuplicateContent {
                existing_code: existing.code.clone(),
            });
        }

        let mapping = new_mapping.into_mapping();
        rows.insert(mapping.code.clone(), mapping.clone());
        Ok(mapping)
    }

    async fn increment_visits(&self, code: &str) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(code) {
            Some(mapping) => {
                mapping.visits += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_blocked(&self, code: &str) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(code) {
            Some(mapping) if mapping.is_active() => {
                mapping.status = MappingStatus::Blocked;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn list_active_expired(&self, now: DateTime<Utc>) -> CodeStream {
        let rows = self.rows.clone();

        stream::once(async move {
            let rows = rows.read().await;
            rows.values()
                .filter(|m| m.is_active() && m.is_expired_at(now))
                .map(|m| m.code.clone())
                .collect::<Vec<_>>()
        })
        .flat_map(|codes| stream::iter(codes.into_iter().map(Ok::<_, StoreError>)))
        .boxed()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Counters behind a single mutex; increments are serialized.
#[derive(Default)]
pub struct MemoryCounterRepository {
    values: Mutex<HashMap<String, i64>>,
}

impl MemoryCounterRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterRepository for MemoryCounterRepository {
    async fn next_value(&self, name: &str, start: i64) -> Result<i64, StoreError> {
        let mut values = self.values.lock().await;
        let value = values.entry(name.to_string()).or_insert(start);
        *value += 1;
        Ok(*value)
    }

    async fn current_value(&self, name: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.values.lock().await.get(name).copied())
    }
}

#[derive(Default)]
pub struct MemoryAliasRepository {
    aliases: RwLock<BTreeMap<String, String>>,
}

impl MemoryAliasRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AliasRepository for MemoryAliasRepository {
    async fn resolve(&self, path: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .aliases
            .read()
            .await
            .get(path.trim_matches('/'))
            .cloned())
    }

    async fn upsert(&self, alias: PathAlias) -> Result<(), StoreError> {
        self.aliases
            .write()
            .await
            .insert(alias.alias.trim_matches('/').to_string(), alias.target);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PathAlias>, StoreError> {
        Ok(self
            .aliases
            .read()
            .await
            .iter()
            .map(|(alias, target)| PathAlias {
                alias: alias.clone(),
                target: target.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_mapping(code: &str, hash: Option<&str>, expire_at: Option<DateTime<Utc>>) -> NewMapping {
        NewMapping {
            code: code.to_string(),
            destination: format!("https://example.com/{code}"),
            content_hash: hash.map(str::to_string),
            created_at: Utc::now(),
            expire_at,
            owner_id: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code_even_when_blocked() {
        let repo = MemoryMappingRepository::new();
        repo.create(new_mapping("abc", None, None)).await.unwrap();
        repo.set_blocked("abc").await.unwrap();

        let err = repo.create(new_mapping("abc", None, None)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateCode(code) if code == "abc"));
    }

    #[tokio::test]
    async fn test_duplicate_content_only_among_active() {
        let repo = MemoryMappingRepository::new();
        repo.create(new_mapping("a", Some("h"), None)).await.unwrap();

        let err = repo.create(new_mapping("b", Some("h"), None)).await.unwrap_err();
        assert!(
            matches!(err, StoreError::DuplicateContent { existing_code } if existing_code == "a")
        );

        repo.set_blocked("a").await.unwrap();
        assert!(repo.create(new_mapping("b", Some("h"), None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_set_blocked_is_conditional() {
        let repo = MemoryMappingRepository::new();
        repo.create(new_mapping("abc", None, None)).await.unwrap();

        assert!(repo.set_blocked("abc").await.unwrap());
        assert!(!repo.set_blocked("abc").await.unwrap());
        assert!(!repo.set_blocked("missing").await.unwrap());
        assert!(repo.find_by_code("abc", true).await.unwrap().is_none());
        assert!(repo.find_by_code("abc", false).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_increment_visits() {
        let repo = MemoryMappingRepository::new();
        repo.create(new_mapping("abc", None, None)).await.unwrap();

        for _ in 0..5 {
            assert!(repo.increment_visits("abc").await.unwrap());
        }
        assert!(!repo.increment_visits("missing").await.unwrap());

        let mapping = repo.find_by_code("abc", false).await.unwrap().unwrap();
        assert_eq!(mapping.visits, 5);
    }

    #[tokio::test]
    async fn test_list_active_expired() {
        let now = Utc::now();
        let repo = MemoryMappingRepository::new();
        repo.create(new_mapping("past", None, Some(now - Duration::hours(1))))
            .await
            .unwrap();
        repo.create(new_mapping("edge", None, Some(now))).await.unwrap();
        repo.create(new_mapping("future", None, Some(now + Duration::hours(1))))
            .await
            .unwrap();
        repo.create(new_mapping("never", None, None)).await.unwrap();
        repo.create(new_mapping("gone", None, Some(now - Duration::hours(1))))
            .await
            .unwrap();
        repo.set_blocked("gone").await.unwrap();

        let codes: Vec<String> = repo
            .list_active_expired(now)
            .map(|r| r.unwrap())
            .collect()
            .await;

        assert_eq!(codes, vec!["edge".to_string(), "past".to_string()]);
    }

    #[tokio::test]
    async fn test_counter_starts_after_start_value() {
        let counter = MemoryCounterRepository::new();

        assert_eq!(counter.current_value("c").await.unwrap(), None);
        assert_eq!(counter.next_value("c", 146).await.unwrap(), 147);
        assert_eq!(counter.next_value("c", 146).await.unwrap(), 148);
        assert_eq!(counter.current_value("c").await.unwrap(), Some(148));
    }

    #[tokio::test]
    async fn test_alias_lookup_ignores_slashes() {
        let aliases = MemoryAliasRepository::new();
        aliases
            .upsert(PathAlias {
                alias: "/about".to_string(),
                target: "/node/1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(aliases.resolve("about").await.unwrap().as_deref(), Some("/node/1"));
        assert_eq!(aliases.list().await.unwrap().len(), 1);
        assert!(aliases.resolve("contact").await.unwrap().is_none());
    }
}
