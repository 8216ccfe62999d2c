//! Background worker that applies queued visit increments.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info};

use crate::domain::repositories::{MappingRepository, StoreError};
use crate::domain::visit_event::VisitEvent;

/// Attempts after the first failure of a transient increment.
const MAX_RETRIES: usize = 3;

/// Drains `rx` and increments visit counters with at most `concurrency`
/// writes in flight.
///
/// Transient store failures are retried with jittered exponential backoff.
/// An increment for a mapping that no longer exists is dropped. The worker
/// returns once every sender is gone and in-flight writes have finished.
pub async fn run_visit_worker<M>(
    mut rx: mpsc::Receiver<VisitEvent>,
    store: Arc<M>,
    concurrency: usize,
) where
    M: MappingRepository + ?Sized + 'static,
{
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let store = store.clone();

        tokio::spawn(async move {
            record_visit(store.as_ref(), &event).await;
            drop(permit);
        });
    }

    // Wait for in-flight increments before returning.
    let _ = permits.acquire_many(concurrency as u32).await;
    info!("Visit worker stopped");
}

/// Applies a single increment, retrying transient failures.
pub async fn record_visit<M>(store: &M, event: &VisitEvent)
where
    M: MappingRepository + ?Sized,
{
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(MAX_RETRIES);

    let result = RetryIf::start(
        strategy,
        || store.increment_visits(&event.code),
        |e: &StoreError| e.is_transient(),
    )
    .await;

    match result {
        Ok(true) => debug!(code = %event.code, "Visit recorded"),
        Ok(false) => debug!(code = %event.code, "Visit dropped, mapping no longer exists"),
        Err(e) => error!(code = %event.code, error = %e, "Failed to record visit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockMappingRepository;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_record_visit_retries_transient_errors() {
        let mut store = MockMappingRepository::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        store
            .expect_increment_visits()
            .times(3)
            .returning(move |_| {
                if seen.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StoreError::Unavailable("connection reset".into()))
                } else {
                    Ok(true)
                }
            });

        record_visit(&store, &VisitEvent::new("abc")).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_record_visit_does_not_retry_missing_mapping() {
        let mut store = MockMappingRepository::new();
        store
            .expect_increment_visits()
            .times(1)
            .returning(|_| Ok(false));

        record_visit(&store, &VisitEvent::new("gone")).await;
    }

    #[tokio::test]
    async fn test_worker_drains_queue_then_stops() {
        let mut store = MockMappingRepository::new();
        store
            .expect_increment_visits()
            .withf(|code| code == "abc")
            .times(5)
            .returning(|_| Ok(true));

        let (tx, rx) = mpsc::channel(16);
        for _ in 0..5 {
            tx.send(VisitEvent::new("abc")).await.unwrap();
        }
        drop(tx);

        run_visit_worker(rx, Arc::new(store), 2).await;
    }
}
