//! Mapping entity: one short code bound to one destination.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a mapping.
///
/// The only transition is `Active -> Blocked`. There is no way to
/// move a mapping back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingStatus {
    Active,
    Blocked,
}

impl MappingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "blocked" => Ok(Self::Blocked),
            other => Err(format!("unknown mapping status `{other}`")),
        }
    }
}

/// A stored short code with its destination and lifecycle metadata.
///
/// `code` and `destination` never change after creation. `visits` only grows
/// and `status` only moves forward, see [`MappingStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub code: String,
    pub destination: String,
    pub content_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
    pub status: MappingStatus,
    pub visits: i64,
    /// Creator; `None` for anonymous creations.
    pub owner_id: Option<String>,
}

impl Mapping {
    /// Returns true if the mapping has an expiration at or before `now`.
    ///
    /// Expiration is derived, not stored: a mapping can be expired and still
    /// `Active` until the resolver or the sweeper processes it.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|expire_at| expire_at <= now)
    }

    /// Returns true if the mapping has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Builds the public short URL under `base_url`.
    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.code)
    }
}

/// Input data for creating a new mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMapping {
    pub code: String,
    pub destination: String,
    pub content_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
    pub owner_id: Option<String>,
}

impl NewMapping {
    /// Materializes the stored form: `Active` with zero visits.
    pub fn into_mapping(self) -> Mapping {
        Mapping {
            code: self.code,
            destination: self.destination,
            content_hash: self.content_hash,
            created_at: self.created_at,
            expire_at: self.expire_at,
            status: MappingStatus::Active,
            visits: 0,
            owner_id: self.owner_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn mapping(expire_at: Option<DateTime<Utc>>) -> Mapping {
        NewMapping {
            code: "abc".to_string(),
            destination: "https://example.com/x".to_string(),
            content_hash: None,
            created_at: Utc::now(),
            expire_at,
            owner_id: None,
        }
        .into_mapping()
    }

    #[test]
    fn test_new_mapping_starts_active_without_visits() {
        let m = mapping(None);
        assert_eq!(m.status, MappingStatus::Active);
        assert_eq!(m.visits, 0);
        assert!(m.is_active());
    }

    #[test]
    fn test_never_expires_without_expire_at() {
        let m = mapping(None);
        assert!(!m.is_expired());
        assert!(!m.is_expired_at(Utc::now() + Duration::days(10_000)));
    }

    #[test]
    fn test_expired_at_boundary_is_inclusive() {
        let t = Utc::now();
        let m = mapping(Some(t));
        assert!(!m.is_expired_at(t - Duration::seconds(1)));
        assert!(m.is_expired_at(t));
        assert!(m.is_expired_at(t + Duration::seconds(1)));
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [MappingStatus::Active, MappingStatus::Blocked] {
            assert_eq!(status.as_str().parse::<MappingStatus>().unwrap(), status);
        }
        assert!("enabled".parse::<MappingStatus>().is_err());
    }

    #[test]
    fn test_short_url_trims_trailing_slash() {
        let m = mapping(None);
        assert_eq!(m.short_url("https://s.example.com/"), "https://s.example.com/abc");
        assert_eq!(m.short_url("https://s.example.com"), "https://s.example.com/abc");
    }
}
