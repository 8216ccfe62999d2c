//! Errors shared by every repository implementation.

/// Failure reported by a repository.
///
/// Uniqueness conflicts are classified so that callers can tell an allocator
/// bug (`DuplicateCode`) from a user-facing duplicate (`DuplicateContent`).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A mapping with this code already exists, whatever its status.
    #[error("short code `{0}` already exists")]
    DuplicateCode(String),

    /// A live mapping already points at the same destination.
    #[error("destination is already shortened as `{existing_code}`")]
    DuplicateContent { existing_code: String },

    /// The backing store could not be reached or rejected the query.
    #[error("mapping store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns true for failures that may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return match db.constraint() {
                Some("mappings_active_content_hash_key") => Self::DuplicateContent {
                    existing_code: String::new(),
                },
                _ => Self::DuplicateCode(String::new()),
            };
        }

        Self::Unavailable(e.to_string())
    }
}
