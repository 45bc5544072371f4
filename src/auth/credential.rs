use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds of remaining lifetime below which a token counts as stale.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

/// OAuth credential persisted between runs.
///
/// # Example
/// ```no_run
/// use ampgate::auth::Credential;
/// use chrono::Utc;
///
/// let credential = Credential {
///     access_token: Some("access".to_string()),
///     refresh_token: Some("refresh".to_string()),
///     issued_at: Some(Utc::now()),
///     expires_in: Some(3600),
/// };
/// assert!(!credential.needs_refresh());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_in: Option<i64>,
}

impl Credential {
    /// Seconds of lifetime left at `now`, if issue metadata is present.
    pub fn remaining_secs_at(&self, now: DateTime<Utc>) -> Option<i64> {
        let issued = self.issued_at?;
        let lifetime = self.expires_in?;
        Some(lifetime - (now - issued).num_seconds())
    }

    /// Whether the access token must be refreshed before use at `now`.
    ///
    /// An absent access token or absent issue metadata counts as stale,
    /// as does anything within [`EXPIRY_MARGIN_SECS`] of expiry.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_none() {
            return true;
        }
        match self.remaining_secs_at(now) {
            Some(remaining) => remaining <= EXPIRY_MARGIN_SECS,
            None => true,
        }
    }

    /// Wall-clock form of [`needs_refresh_at`](Self::needs_refresh_at).
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }
}
