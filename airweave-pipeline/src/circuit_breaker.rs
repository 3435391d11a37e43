//! Per-provider circuit breaker: trips on repeated transient failures,
//! skips the provider for a cooldown, then reattempts half-open.
//!
//! Keyed like `airweave_rate_limit::RateLimiter`, generalized from a token
//! bucket to a three-state machine.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_TRIP_THRESHOLD: u32 = 5;
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerPhase {
    Closed,
    Open,
    HalfOpen,
}

struct BreakerState {
    phase: BreakerPhase,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl Default for BreakerState {
    fn default() -> Self {
        Self {
            phase: BreakerPhase::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permit {
    /// Proceed with the call.
    Go,
    /// Provider is tripped; skip this call for the cooldown.
    Skip,
}

/// Process-wide, lazily-populated per-provider breaker registry.
#[derive(Clone)]
pub struct CircuitBreaker {
    states: Arc<DashMap<String, BreakerState>>,
    trip_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_TRIP_THRESHOLD, DEFAULT_COOLDOWN)
    }

    pub fn with_policy(trip_threshold: u32, cooldown: Duration) -> Self {
        Self {
            states: Arc::new(DashMap::new()),
            trip_threshold,
            cooldown,
        }
    }

    /// Call before attempting a provider call.
    pub fn permit(&self, provider: &str) -> Permit {
        let mut entry = self.states.entry(provider.to_string()).or_default();
        match entry.phase {
            BreakerPhase::Closed => Permit::Go,
            BreakerPhase::HalfOpen => Permit::Go,
            BreakerPhase::Open => {
                let elapsed = entry.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed >= self.cooldown {
                    entry.phase = BreakerPhase::HalfOpen;
                    Permit::Go
                } else {
                    Permit::Skip
                }
            }
        }
    }

    pub fn record_success(&self, provider: &str) {
        let mut entry = self.states.entry(provider.to_string()).or_default();
        entry.phase = BreakerPhase::Closed;
        entry.consecutive_failures = 0;
        entry.opened_at = None;
    }

    pub fn record_failure(&self, provider: &str) {
        let mut entry = self.states.entry(provider.to_string()).or_default();
        match entry.phase {
            BreakerPhase::HalfOpen => {
                entry.phase = BreakerPhase::Open;
                entry.opened_at = Some(Instant::now());
            }
            BreakerPhase::Closed => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures >= self.trip_threshold {
                    entry.phase = BreakerPhase::Open;
                    entry.opened_at = Some(Instant::now());
                }
            }
            BreakerPhase::Open => {}
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
