//! Session state for an in-flight OAuth flow.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const REDIRECT_SESSION_TTL_HOURS: i64 = 24;
pub const INIT_SESSION_TTL_MINUTES: i64 = 30;

/// Bring-your-own-client overrides. These live only on the
/// `ConnectionInitSession` — they are never persisted past session
/// completion or expiry, so `zeroize` wipes the backing strings in place
/// rather than relying on the allocator to happen to reuse the memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Overrides {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub oauth_token_secret: Option<String>,
}

fn zero(s: &mut String) {
    let len = s.len();
    s.clear();
    s.push_str(&"0".repeat(len));
    s.clear();
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.client_id.is_none()
            && self.client_secret.is_none()
            && self.consumer_key.is_none()
            && self.consumer_secret.is_none()
            && self.oauth_token_secret.is_none()
    }

    pub fn zeroize(&mut self) {
        for field in [
            &mut self.client_id,
            &mut self.client_secret,
            &mut self.consumer_key,
            &mut self.consumer_secret,
            &mut self.oauth_token_secret,
        ] {
            if let Some(s) = field {
                zero(s);
            }
            *field = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionInitSessionStatus {
    Pending,
    Completed,
    Expired,
    Cancelled,
}

/// Points a short-lived proxy code at the real provider authorize URL so
/// the provider-specific URL never appears in a link shown to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectSession {
    pub code: String,
    pub provider_url: String,
    pub expires_at: DateTime<Utc>,
}

impl RedirectSession {
    pub fn new(code: impl Into<String>, provider_url: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            provider_url: provider_url.into(),
            expires_at: now + Duration::hours(REDIRECT_SESSION_TTL_HOURS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Tracks one in-flight OAuth init → callback round trip. Keyed by `state`
/// for OAuth2 or `oauth_token` for OAuth1 — both referred to generically
/// as the session key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInitSession {
    pub id: Uuid,
    pub session_key: String,
    pub short_name: String,
    pub organization_id: Uuid,
    pub payload: serde_json::Value,
    pub overrides: Overrides,
    pub status: ConnectionInitSessionStatus,
    pub expires_at: DateTime<Utc>,
    pub redirect_session_code: String,
    pub code_verifier: Option<String>,
}

impl ConnectionInitSession {
    pub fn new(
        session_key: impl Into<String>,
        short_name: impl Into<String>,
        organization_id: Uuid,
        payload: serde_json::Value,
        overrides: Overrides,
        redirect_session_code: impl Into<String>,
        code_verifier: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_key: session_key.into(),
            short_name: short_name.into(),
            organization_id,
            payload,
            overrides,
            status: ConnectionInitSessionStatus::Pending,
            expires_at: now + Duration::minutes(INIT_SESSION_TTL_MINUTES),
            redirect_session_code: redirect_session_code.into(),
            code_verifier,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroize_clears_all_override_fields() {
        let mut overrides = Overrides {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            consumer_key: None,
            consumer_secret: None,
            oauth_token_secret: None,
        };
        overrides.zeroize();
        assert!(overrides.is_empty());
    }

    #[test]
    fn redirect_session_expires_after_24h() {
        let now = Utc::now();
        let session = RedirectSession::new("abc12345", "https://provider/authorize", now);
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + Duration::hours(25)));
    }
}
