use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use url_redirector::domain::repositories::{AliasRepository, CounterRepository, PathAlias};
use url_redirector::infrastructure::persistence::{PgAliasRepository, PgCounterRepository};

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_counter_starts_after_start_value(pool: PgPool) {
    let repo = PgCounterRepository::new(Arc::new(pool));

    assert_eq!(repo.current_value("codes").await.unwrap(), None);
    assert_eq!(repo.next_value("codes", 146).await.unwrap(), 147);
    assert_eq!(repo.next_value("codes", 146).await.unwrap(), 148);
    assert_eq!(repo.current_value("codes").await.unwrap(), Some(148));
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_counters_are_independent(pool: PgPool) {
    let repo = PgCounterRepository::new(Arc::new(pool));

    assert_eq!(repo.next_value("a", 0).await.unwrap(), 1);
    assert_eq!(repo.next_value("b", 100).await.unwrap(), 101);
    assert_eq!(repo.next_value("a", 0).await.unwrap(), 2);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_increments_are_unique(pool: PgPool) {
    let repo = Arc::new(PgCounterRepository::new(Arc::new(pool)));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.next_value("codes", 0).await })
        })
        .collect();

    let mut values = HashSet::new();
    for handle in handles {
        assert!(values.insert(handle.await.unwrap().unwrap()));
    }

    assert_eq!(values, (1..=20).collect::<HashSet<i64>>());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_alias_upsert_and_resolve(pool: PgPool) {
    let repo = PgAliasRepository::new(Arc::new(pool));

    repo.upsert(PathAlias {
        alias: "/about/".to_string(),
        target: "/node/1".to_string(),
    })
    .await
    .unwrap();
    repo.upsert(PathAlias {
        alias: "about".to_string(),
        target: "/node/2".to_string(),
    })
    .await
    .unwrap();

    assert_eq!(repo.resolve("about").await.unwrap().as_deref(), Some("/node/2"));
    assert!(repo.resolve("contact").await.unwrap().is_none());
    assert_eq!(repo.list().await.unwrap().len(), 1);
}
