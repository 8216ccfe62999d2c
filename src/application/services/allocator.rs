//! Short-code allocation from a persisted monotonic counter.
//!
//! Every attempt consumes a fresh counter value, including attempts whose
//! code is rejected. Because the counter never hands out a value twice, two
//! allocators can only race on the increment itself, which the
//! [`CounterRepository`] performs atomically.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, instrument};

use crate::domain::alphabet::Alphabet;
use crate::domain::path_conflict::PathConflictChecker;
use crate::domain::repositories::{
    CounterRepository, MappingRepository, SHORT_CODE_COUNTER, StoreError,
};

/// Default cap on candidates tried by one allocation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// Failure to produce a short code.
#[derive(Debug, thiserror::Error)]
pub enum AllocationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Every candidate within the attempt budget was taken or reserved.
    #[error("no free short code after {attempts} candidates")]
    Exhausted { attempts: u32 },
}

/// Allocation parameters taken from configuration.
#[derive(Debug, Clone)]
pub struct AllocatorSettings {
    pub alphabet: Alphabet,
    /// Counter value used when the counter row does not exist yet.
    pub counter_start: i64,
    pub max_attempts: u32,
}

impl Default for AllocatorSettings {
    fn default() -> Self {
        let alphabet = Alphabet::default();
        let counter_start = i64::try_from(alphabet.default_counter_start()).unwrap_or(i64::MAX);

        Self {
            alphabet,
            counter_start,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Produces the next unused, route-safe short code.
pub struct CodeAllocator<M, C, P>
where
    M: MappingRepository + ?Sized,
    C: CounterRepository + ?Sized,
    P: PathConflictChecker + ?Sized,
{
    mappings: Arc<M>,
    counter: Arc<C>,
    conflicts: Arc<P>,
    settings: AllocatorSettings,
}

impl<M, C, P> CodeAllocator<M, C, P>
where
    M: MappingRepository + ?Sized,
    C: CounterRepository + ?Sized,
    P: PathConflictChecker + ?Sized,
{
    pub fn new(
        mappings: Arc<M>,
        counter: Arc<C>,
        conflicts: Arc<P>,
        settings: AllocatorSettings,
    ) -> Self {
        Self {
            mappings,
            counter,
            conflicts,
            settings,
        }
    }

    /// Returns a code that no mapping uses and no host route reserves.
    ///
    /// # Algorithm
    ///
    /// 1. Atomically increment the counter and read the new value
    /// 2. Encode it with the configured alphabet
    /// 3. If the code exists or is reserved, discard the value and repeat
    ///
    /// Discarded values are never retried.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::Store`] if the counter or a check cannot be read
    /// - [`AllocationError::Exhausted`] after `max_attempts` rejected candidates
    #[instrument(skip(self))]
    pub async fn allocate_next(&self) -> Result<String, AllocationError> {
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let value = self
                .counter
                .next_value(SHORT_CODE_COUNTER, self.settings.counter_start)
                .await?;
            let value = u64::try_from(value).map_err(|_| {
                StoreError::Unavailable(format!("counter returned negative value {value}"))
            })?;

            let candidate = self.settings.alphabet.encode(value);

            if self.mappings.exists(&candidate).await? {
                debug!(attempt, value, %candidate, "Candidate already used");
                counter!("allocation_candidates_rejected_total", "reason" => "exists").increment(1);
                continue;
            }

            if self.conflicts.is_reserved(&candidate).await? {
                debug!(attempt, value, %candidate, "Candidate collides with a reserved path");
                counter!("allocation_candidates_rejected_total", "reason" => "reserved")
                    .increment(1);
                continue;
            }

            debug!(attempt, value, code = %candidate, "Allocated short code");
            return Ok(candidate);
        }

        Err(AllocationError::Exhausted {
            attempts: max_attempts,
        })
    }
}
