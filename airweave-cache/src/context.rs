//! Short-TTL cache for org / user / api-key → org mappings, and the JWT
//! blacklist, both consumed by the context resolver.
//!
//! Two distinct failure policies: the org/user mapping cache fails
//! *open* (an unreachable backing store should never block a request),
//! while the JWT blacklist fails *closed* (an unreachable backing store
//! must deny the token).

use crate::ttl::TtlCache;
use airweave_core::types::{OrganizationId, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Default TTL for org / user / api-key caches (`context_cache_service.py`
/// uses a short TTL to bound staleness against role/org changes).
pub const DEFAULT_CONTEXT_TTL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ContextCache {
    org_by_user: TtlCache<UserId, OrganizationId>,
    org_by_api_key_hash: TtlCache<String, OrganizationId>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CONTEXT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            org_by_user: TtlCache::new(ttl),
            org_by_api_key_hash: TtlCache::new(ttl),
        }
    }

    pub fn cache_user_org(&self, user: UserId, org: OrganizationId) {
        self.org_by_user.insert(user, org);
    }

    pub fn user_org(&self, user: &UserId) -> Option<OrganizationId> {
        self.org_by_user.get(user)
    }

    pub fn cache_api_key_org(&self, key_hash: String, org: OrganizationId) {
        self.org_by_api_key_hash.insert(key_hash, org);
    }

    pub fn api_key_org(&self, key_hash: &str) -> Option<OrganizationId> {
        self.org_by_api_key_hash.get(&key_hash.to_string())
    }

    pub fn invalidate_user(&self, user: &UserId) {
        self.org_by_user.remove(user);
    }
}

impl Default for ContextCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Reason a token was blacklisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlacklistReason {
    /// A single token (by `jti`) was explicitly revoked.
    ExplicitRevocation,
    /// Every token issued before `cutoff` for a given user is invalid
    /// (e.g. "log out everywhere").
    IssuedAtCutoff,
}

/// Pluggable blacklist backend. A production deployment backs this with
/// Redis (TTL >= max token lifetime); tests use the in-memory
/// implementation below.
pub trait BlacklistBackend: Send + Sync {
    /// Returns `Ok(true)` if the jti is blacklisted, `Ok(false)` if not,
    /// `Err` if the backend could not be reached.
    fn is_jti_blacklisted(&self, jti: &str) -> Result<bool, BlacklistUnavailable>;
    /// Returns the iat cutoff for a user's email, if one has been set.
    fn email_cutoff(&self, email: &str) -> Result<Option<DateTime<Utc>>, BlacklistUnavailable>;
    fn blacklist_jti(&self, jti: &str);
    fn blacklist_email_before(&self, email: &str, cutoff: DateTime<Utc>);
}

#[derive(Debug, Clone, Copy)]
pub struct BlacklistUnavailable;

/// In-memory blacklist backend (DashMap-style, via `TtlCache` with a long
/// TTL) — used for tests and single-process deployments.
#[derive(Clone)]
pub struct InMemoryBlacklist {
    jtis: TtlCache<String, ()>,
    email_cutoffs: TtlCache<String, DateTime<Utc>>,
    /// When true, simulates an unreachable backend for testing the
    /// fail-closed path.
    simulate_unavailable: Arc<std::sync::atomic::AtomicBool>,
}

impl InMemoryBlacklist {
    pub fn new(max_token_lifetime: Duration) -> Self {
        Self {
            jtis: TtlCache::new(max_token_lifetime),
            email_cutoffs: TtlCache::new(max_token_lifetime),
            simulate_unavailable: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Test hook: force the backend to report unavailable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.simulate_unavailable
            .store(unavailable, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), BlacklistUnavailable> {
        if self.simulate_unavailable.load(std::sync::atomic::Ordering::SeqCst) {
            Err(BlacklistUnavailable)
        } else {
            Ok(())
        }
    }
}

impl BlacklistBackend for InMemoryBlacklist {
    fn is_jti_blacklisted(&self, jti: &str) -> Result<bool, BlacklistUnavailable> {
        self.check_available()?;
        Ok(self.jtis.get(&jti.to_string()).is_some())
    }

    fn email_cutoff(&self, email: &str) -> Result<Option<DateTime<Utc>>, BlacklistUnavailable> {
        self.check_available()?;
        Ok(self.email_cutoffs.get(&email.to_string()))
    }

    fn blacklist_jti(&self, jti: &str) {
        self.jtis.insert(jti.to_string(), ());
    }

    fn blacklist_email_before(&self, email: &str, cutoff: DateTime<Utc>) {
        self.email_cutoffs.insert(email.to_string(), cutoff);
    }
}

/// Decide whether a token is accepted, given its `jti`, the owning user's
/// `email`, and the token's `iat`. **Fails closed**: if the backend cannot
/// be reached, the token is rejected.
pub fn is_token_blacklisted(
    backend: &dyn BlacklistBackend,
    jti: &str,
    email: &str,
    issued_at: DateTime<Utc>,
) -> bool {
    let jti_blacklisted = match backend.is_jti_blacklisted(jti) {
        Ok(v) => v,
        Err(BlacklistUnavailable) => return true, // fail closed
    };
    if jti_blacklisted {
        return true;
    }
    match backend.email_cutoff(email) {
        Ok(Some(cutoff)) => issued_at <= cutoff,
        Ok(None) => false,
        Err(BlacklistUnavailable) => true, // fail closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_jti_revocation_blocks_token() {
        let backend = InMemoryBlacklist::new(Duration::from_secs(3600));
        backend.blacklist_jti("jti-1");
        assert!(is_token_blacklisted(&backend, "jti-1", "a@b.com", Utc::now()));
        assert!(!is_token_blacklisted(&backend, "jti-2", "a@b.com", Utc::now()));
    }

    #[test]
    fn iat_cutoff_blocks_older_tokens_only() {
        let backend = InMemoryBlacklist::new(Duration::from_secs(3600));
        let cutoff = Utc::now();
        backend.blacklist_email_before("a@b.com", cutoff);
        let older = cutoff - chrono::Duration::seconds(5);
        let newer = cutoff + chrono::Duration::seconds(5);
        assert!(is_token_blacklisted(&backend, "jti-x", "a@b.com", older));
        assert!(!is_token_blacklisted(&backend, "jti-y", "a@b.com", newer));
    }

    #[test]
    fn unreachable_backend_fails_closed() {
        let backend = InMemoryBlacklist::new(Duration::from_secs(3600));
        backend.set_unavailable(true);
        assert!(is_token_blacklisted(&backend, "jti-z", "a@b.com", Utc::now()));
    }

    #[test]
    fn context_cache_roundtrip() {
        let cache = ContextCache::with_ttl(Duration::from_secs(60));
        let user = UserId::new();
        let org = OrganizationId::new();
        cache.cache_user_org(user, org);
        assert_eq!(cache.user_org(&user), Some(org));
        cache.invalidate_user(&user);
        assert_eq!(cache.user_org(&user), None);
    }
}
