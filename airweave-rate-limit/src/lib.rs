//! `airweave-rate-limit` — per-provider / per-organization token & request
//! budgets.
//!
//! A token-bucket implementation where `check()` returns the rich
//! `(allowed, retry_after, limit, remaining)` tuple the context resolver
//! needs, instead of a bare bool.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

#[inline]
fn refill_and_try_consume(
    tokens: &mut f64,
    last_refill: &mut Instant,
    max_tokens: f64,
    window: Duration,
) -> bool {
    let now = Instant::now();
    let elapsed = now.duration_since(*last_refill);
    let refill = (elapsed.as_secs_f64() / window.as_secs_f64()) * max_tokens;
    *tokens = (*tokens + refill).min(max_tokens);
    *last_refill = now;

    if *tokens >= 1.0 {
        *tokens -= 1.0;
        true
    } else {
        false
    }
}

/// Outcome of a rate-limit check, as consumed by the context resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Seconds the caller should wait before retrying. `0` when allowed.
    pub retry_after_secs: u64,
    pub limit: u64,
    pub remaining: u64,
}

impl RateLimitDecision {
    /// The decision used when the limiter backend itself failed: never
    /// block a request on a limiter outage.
    pub fn fail_open() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
            limit: 0,
            remaining: 0,
        }
    }
}

/// A token-bucket rate limiter keyed by an arbitrary type (organization id,
/// provider name, or a composite key).
#[derive(Clone)]
pub struct RateLimiter<K> {
    buckets: Arc<DashMap<K, TokenBucket>>,
    max_tokens: f64,
    window: Duration,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    pub fn new(max: u64, window: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            max_tokens: max as f64,
            window,
        }
    }

    /// Check and consume one token for `key`, returning a full decision.
    pub fn check(&self, key: &K) -> RateLimitDecision {
        let mut entry = self
            .buckets
            .entry(key.clone())
            .or_insert_with(|| TokenBucket {
                tokens: self.max_tokens,
                last_refill: Instant::now(),
            });

        let bucket = entry.value_mut();
        let allowed =
            refill_and_try_consume(&mut bucket.tokens, &mut bucket.last_refill, self.max_tokens, self.window);
        let remaining = bucket.tokens.floor().max(0.0) as u64;
        let retry_after_secs = if allowed {
            0
        } else {
            // Seconds until at least one token refills.
            let per_token = self.window.as_secs_f64() / self.max_tokens.max(1.0);
            per_token.ceil() as u64
        };

        RateLimitDecision {
            allowed,
            retry_after_secs,
            limit: self.max_tokens as u64,
            remaining,
        }
    }

    pub fn try_acquire(&self, key: &K) -> bool {
        self.check(key).allowed
    }
}

/// Registry of rate limiters keyed by provider name (OpenAI, FastEmbed
/// service, etc.) sized from each provider's RPM/TPM limits.
#[derive(Clone, Default)]
pub struct ProviderRateLimiters {
    limiters: Arc<DashMap<String, RateLimiter<()>>>,
}

impl ProviderRateLimiters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, provider: impl Into<String>, max_requests_per_window: u64, window: Duration) {
        self.limiters
            .insert(provider.into(), RateLimiter::new(max_requests_per_window, window));
    }

    pub fn check(&self, provider: &str) -> RateLimitDecision {
        match self.limiters.get(provider) {
            Some(limiter) => limiter.check(&()),
            None => RateLimitDecision::fail_open(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_then_blocks() {
        let limiter: RateLimiter<&str> = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.check(&"org-1").allowed);
        assert!(limiter.check(&"org-1").allowed);
        let decision = limiter.check(&"org-1");
        assert!(!decision.allowed);
        assert!(decision.retry_after_secs > 0);
    }

    #[test]
    fn keys_are_independent() {
        let limiter: RateLimiter<&str> = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check(&"org-1").allowed);
        assert!(limiter.check(&"org-2").allowed);
    }

    #[test]
    fn unregistered_provider_fails_open() {
        let registry = ProviderRateLimiters::new();
        let decision = registry.check("unknown-provider");
        assert!(decision.allowed);
        assert_eq!(decision.limit, 0);
    }

    #[test]
    fn registered_provider_enforces_limit() {
        let registry = ProviderRateLimiters::new();
        registry.register("openai", 1, Duration::from_secs(60));
        assert!(registry.check("openai").allowed);
        assert!(!registry.check("openai").allowed);
    }
}
