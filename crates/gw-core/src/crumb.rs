//! CSRF crumb cache entry (spec.md §3, "CSRF Crumb Entry").

use chrono::{DateTime, Utc};

/// Per-service Jenkins CSRF crumb state.
///
/// Populated on first write that needs one, refreshed on expiry. A service
/// that returned 404 from its crumb endpoint is permanently tombstoned —
/// the endpoint is never retried.
#[derive(Debug, Clone)]
pub enum CrumbEntry {
    /// A live crumb: header field name, token value, and expiry.
    Active {
        /// Header name to send the token under (e.g. `Jenkins-Crumb`).
        field: String,
        /// The token value.
        token: String,
        /// When this token stops being valid.
        expiry: DateTime<Utc>,
    },
    /// This service's crumb endpoint returned 404; never consult it again.
    Disabled,
}

impl CrumbEntry {
    /// Ten minutes — the crumb lifetime mandated by spec.md §4.3 step 5.
    pub const TTL_SECONDS: i64 = 600;

    /// Build a fresh active entry expiring `TTL_SECONDS` from `now`.
    #[must_use]
    pub fn active(field: impl Into<String>, token: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::Active {
            field: field.into(),
            token: token.into(),
            expiry: now + chrono::Duration::seconds(Self::TTL_SECONDS),
        }
    }

    /// Whether this entry can still be used as-is at `now`.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Active { expiry, .. } => *expiry > now,
            Self::Disabled => false,
        }
    }
}
