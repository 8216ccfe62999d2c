//! Batch retirement of expired mappings.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use metrics::counter;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::repositories::{MappingRepository, StoreError};

/// Blocks every `Active` mapping whose expiration has passed.
///
/// The sweep lists first and acts second, so a code may be blocked by the
/// resolver or vanish between the two steps; the conditional
/// [`MappingRepository::set_blocked`] turns both cases into no-ops.
pub struct ExpirationSweeper<M: MappingRepository + ?Sized> {
    store: Arc<M>,
}

impl<M: MappingRepository + ?Sized> ExpirationSweeper<M> {
    pub fn new(store: Arc<M>) -> Self {
        Self { store }
    }

    /// Runs one sweep as of `now` and returns how many mappings this call
    /// blocked.
    ///
    /// A failure to block a single code is logged and skipped; the next sweep
    /// picks it up again.
    ///
    /// # Errors
    ///
    /// Returns the store error if the listing itself fails.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut codes = self.store.list_active_expired(now);
        let mut blocked = 0u64;
        let mut failed = 0u64;

        while let Some(code) = codes.next().await {
            let code = code?;

            match self.store.set_blocked(&code).await {
                Ok(true) => {
                    debug!(%code, "Blocked expired mapping");
                    blocked += 1;
                }
                Ok(false) => debug!(%code, "Mapping already blocked or removed"),
                Err(e) => {
                    warn!(%code, error = %e, "Failed to block expired mapping");
                    failed += 1;
                }
            }
        }

        counter!("mappings_blocked_total", "source" => "sweeper").increment(blocked);
        info!(blocked, failed, "Expiration sweep finished");

        Ok(blocked)
    }
}

/// Calls [`ExpirationSweeper::sweep`] every `period` until `shutdown` flips
/// to `true` or its sender is dropped.
pub async fn run_sweep_scheduler<M>(
    sweeper: Arc<ExpirationSweeper<M>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) where
    M: MappingRepository + ?Sized,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = sweeper.sweep(Utc::now()).await {
                    error!(error = %e, "Expiration sweep failed");
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!("Expiration sweeper stopped");
}
