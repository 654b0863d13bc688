use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated identity plus its token and expiry, held client-side.
///
/// Owned exclusively by the [`SessionStore`](super::SessionStore);
/// rehydrated at process start from the persisted snapshot and destroyed
/// on logout or token expiry. Liveness is always computed from
/// `expires_at`, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub identity_id: String,
    pub email: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        identity_id: impl Into<String>,
        email: impl Into<String>,
        session_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity_id: identity_id.into(),
            email: email.into(),
            session_token: session_token.into(),
            expires_at,
        }
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }

    /// Time left until expiry, clamped at zero.
    pub fn remaining_from(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.expires_at - now).to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
