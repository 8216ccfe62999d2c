//! Mapping creation workflow and administrative lookups.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{info, instrument};

use crate::application::services::allocator::CodeAllocator;
use crate::domain::entities::{Mapping, NewMapping};
use crate::domain::path_conflict::PathConflictChecker;
use crate::domain::repositories::{CounterRepository, MappingRepository};
use crate::error::AppError;
use crate::utils::destination::{content_hash, validate_destination};

/// Default upper bound on how far in the future a mapping may expire.
pub const DEFAULT_MAX_EXPIRATION_DAYS: i64 = 365;

/// Creation policy taken from configuration.
#[derive(Debug, Clone)]
pub struct CreationSettings {
    /// Public prefix under which codes are served.
    pub base_url: String,
    /// Store a content hash and reject destinations that already have a
    /// live mapping.
    pub detect_duplicates: bool,
    pub max_expiration: Duration,
}

impl Default for CreationSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            detect_duplicates: true,
            max_expiration: Duration::days(DEFAULT_MAX_EXPIRATION_DAYS),
        }
    }
}

/// Request to shorten one destination.
#[derive(Debug, Clone, Default)]
pub struct CreateMapping {
    pub destination: String,
    pub expire_at: Option<DateTime<Utc>>,
    pub owner_id: Option<String>,
}

/// A stored mapping together with its public URL.
#[derive(Debug, Clone)]
pub struct CreatedMapping {
    pub mapping: Mapping,
    pub short_url: String,
}

/// Service for creating and retrieving mappings.
pub struct MappingService<M, C, P>
where
    M: MappingRepository + ?Sized,
    C: CounterRepository + ?Sized,
    P: PathConflictChecker + ?Sized,
{
    store: Arc<M>,
    allocator: Arc<CodeAllocator<M, C, P>>,
    settings: CreationSettings,
}

impl<M, C, P> MappingService<M, C, P>
where
    M: MappingRepository + ?Sized,
    C: CounterRepository + ?Sized,
    P: PathConflictChecker + ?Sized,
{
    pub fn new(
        store: Arc<M>,
        allocator: Arc<CodeAllocator<M, C, P>>,
        settings: CreationSettings,
    ) -> Self {
        Self {
            store,
            allocator,
            settings,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Creates a mapping at the current time.
    pub async fn create_mapping(&self, request: CreateMapping) -> Result<CreatedMapping, AppError> {
        self.create_mapping_at(request, Utc::now()).await
    }

    /// Validates the request, allocates a code and stores the mapping.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if:
    /// - the destination is not an absolute http(s) URL
    /// - `expire_at` is not in the future or exceeds the configured maximum
    ///
    /// Returns [`AppError::Conflict`] if duplicate detection is on and a live
    /// mapping already points at the destination.
    ///
    /// Returns [`AppError::Internal`] if allocation or the store fails.
    #[instrument(skip(self, request), fields(owner = ?request.owner_id))]
    pub async fn create_mapping_at(
        &self,
        request: CreateMapping,
        now: DateTime<Utc>,
    ) -> Result<CreatedMapping, AppError> {
        let destination = validate_destination(&request.destination)?;

        if let Some(expire_at) = request.expire_at {
            self.check_expiration(expire_at, now)?;
        }

        let hash = if self.settings.detect_duplicates {
            let hash = content_hash(&destination);

            if let Some(existing) = self.store.find_active_by_content_hash(&hash).await? {
                return Err(AppError::conflict(
                    "Destination is already shortened",
                    json!({
                        "existing_code": existing.code,
                        "short_url": existing.short_url(&self.settings.base_url),
                    }),
                ));
            }

            Some(hash)
        } else {
            None
        };

        let code = self.allocator.allocate_next().await?;

        let mapping = self
            .store
            .create(NewMapping {
                code,
                destination,
                content_hash: hash,
                created_at: now,
                expire_at: request.expire_at,
                owner_id: request.owner_id,
            })
            .await?;

        info!(code = %mapping.code, expire_at = ?mapping.expire_at, "Mapping created");

        let short_url = mapping.short_url(&self.settings.base_url);
        Ok(CreatedMapping { mapping, short_url })
    }

    /// Retrieves a mapping by code, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no mapping uses the code.
    pub async fn get_mapping(&self, code: &str) -> Result<Mapping, AppError> {
        self.store
            .find_by_code(code, false)
            .await?
            .ok_or_else(|| AppError::not_found("Mapping not found", json!({ "code": code })))
    }

    /// Blocks a mapping by hand. Returns false if it was already blocked.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no mapping uses the code.
    pub async fn block_mapping(&self, code: &str) -> Result<bool, AppError> {
        if self.store.set_blocked(code).await? {
            info!(%code, "Mapping blocked manually");
            return Ok(true);
        }

        if self.store.exists(code).await? {
            Ok(false)
        } else {
            Err(AppError::not_found("Mapping not found", json!({ "code": code })))
        }
    }

    fn check_expiration(
        &self,
        expire_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if expire_at <= now {
            return Err(AppError::bad_request(
                "Expiration must be in the future",
                json!({ "expire_at": expire_at }),
            ));
        }

        // A cap past the end of the calendar caps nothing.
        let latest = now.checked_add_signed(self.settings.max_expiration);
        if latest.is_some_and(|latest| expire_at > latest) {
            return Err(AppError::bad_request(
                "Expiration is too far in the future",
                json!({
                    "expire_at": expire_at,
                    "max_days": self.settings.max_expiration.num_days(),
                }),
            ));
        }

        Ok(())
    }
}
