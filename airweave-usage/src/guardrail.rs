//! Per-organization usage guardrail: billing-gate checks plus buffered
//! cumulative-metric increments.

use crate::error::UsageError;
use crate::plans::{blocked_actions, BillingPeriodStatus, MetricKind, PlanLimits, UsageAction};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Counts a dynamic metric live (never cached, never buffered).
#[async_trait]
pub trait LiveCounter: Send + Sync {
    async fn current_count(&self, action: UsageAction) -> u64;
}

/// Commits a buffered delta for a cumulative metric to durable storage.
#[async_trait]
pub trait UsageSink: Send + Sync {
    async fn commit(&self, action: UsageAction, delta: i64) -> Result<(), String>;
    async fn cached_total(&self, action: UsageAction) -> u64;
}

const CUMULATIVE_CACHE_TTL: Duration = Duration::from_secs(30);

struct CachedTotal {
    value: u64,
    fetched_at: Instant,
}

struct State {
    pending: HashMap<UsageAction, i64>,
    cache: HashMap<UsageAction, CachedTotal>,
}

/// No billing record on the organization exempts it from all guardrail
/// checks (legacy exemption).
pub struct UsageGuardrail {
    limits: PlanLimits,
    billing_status: Option<BillingPeriodStatus>,
    live: Box<dyn LiveCounter>,
    sink: Box<dyn UsageSink>,
    state: Mutex<State>,
}

impl UsageGuardrail {
    pub fn new(
        limits: PlanLimits,
        billing_status: Option<BillingPeriodStatus>,
        live: Box<dyn LiveCounter>,
        sink: Box<dyn UsageSink>,
    ) -> Self {
        Self {
            limits,
            billing_status,
            live,
            sink,
            state: Mutex::new(State {
                pending: HashMap::new(),
                cache: HashMap::new(),
            }),
        }
    }

    pub async fn is_allowed(&self, action: UsageAction, amount: u64) -> Result<(), UsageError> {
        let Some(status) = self.billing_status else {
            return Ok(());
        };

        if blocked_actions(status).contains(&action) {
            return Err(UsageError::PaymentRequired { action });
        }

        let Some(limit) = self.limits.limit_for(action) else {
            return Ok(());
        };

        match action.kind() {
            MetricKind::Dynamic => {
                let current = self.live.current_count(action).await;
                if current + amount > limit {
                    return Err(UsageError::LimitExceeded { action, current, amount, limit });
                }
            }
            MetricKind::Cumulative => {
                let mut state = self.state.lock().await;
                let cached = self.cached_or_refresh(&mut state, action).await;
                let pending = *state.pending.get(&action).unwrap_or(&0);
                let projected = cached as i64 + pending + amount as i64;
                if projected > limit as i64 {
                    return Err(UsageError::LimitExceeded {
                        action,
                        current: cached,
                        amount,
                        limit,
                    });
                }
            }
        }
        Ok(())
    }

    async fn cached_or_refresh(&self, state: &mut State, action: UsageAction) -> u64 {
        let stale = state
            .cache
            .get(&action)
            .map(|c| c.fetched_at.elapsed() >= CUMULATIVE_CACHE_TTL)
            .unwrap_or(true);
        if stale {
            let value = self.sink.cached_total(action).await;
            state.cache.insert(action, CachedTotal { value, fetched_at: Instant::now() });
            value
        } else {
            state.cache.get(&action).map(|c| c.value).unwrap_or(0)
        }
    }

    /// Buffers an increment, flushing immediately if the pending magnitude
    /// for this action crosses its threshold.
    pub async fn increment(&self, action: UsageAction, amount: u64) -> Result<(), UsageError> {
        self.adjust(action, amount as i64).await
    }

    pub async fn decrement(&self, action: UsageAction, amount: u64) -> Result<(), UsageError> {
        self.adjust(action, -(amount as i64)).await
    }

    async fn adjust(&self, action: UsageAction, delta: i64) -> Result<(), UsageError> {
        let should_flush = {
            let mut state = self.state.lock().await;
            let pending = state.pending.entry(action).or_insert(0);
            *pending += delta;
            pending.unsigned_abs() as i64 >= action.flush_threshold()
        };
        if should_flush {
            self.flush_one(action).await?;
        }
        Ok(())
    }

    async fn flush_one(&self, action: UsageAction) -> Result<(), UsageError> {
        let delta = {
            let mut state = self.state.lock().await;
            state.pending.insert(action, 0).unwrap_or(0)
        };
        self.commit_delta(action, delta).await
    }

    async fn commit_delta(&self, action: UsageAction, delta: i64) -> Result<(), UsageError> {
        if delta == 0 {
            return Ok(());
        }
        self.sink
            .commit(action, delta)
            .await
            .map_err(|reason| UsageError::FlushFailed { action, reason })?;
        let mut state = self.state.lock().await;
        if let Some(cached) = state.cache.get_mut(&action) {
            cached.value = (cached.value as i64 + delta).max(0) as u64;
        }
        Ok(())
    }

    /// Flushes every action with nonzero pending delta. Must be called at
    /// sync termination; callers must not swallow the returned error.
    pub async fn flush_all(&self) -> Result<(), UsageError> {
        let pending_actions: Vec<(UsageAction, i64)> = {
            let mut state = self.state.lock().await;
            let snapshot: Vec<_> = state
                .pending
                .iter()
                .filter(|(_, delta)| **delta != 0)
                .map(|(a, d)| (*a, *d))
                .collect();
            for (action, _) in &snapshot {
                state.pending.insert(*action, 0);
            }
            snapshot
        };

        for (action, delta) in pending_actions {
            self.commit_delta(action, delta).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
    use std::sync::Arc;

    struct FixedLiveCounter(u64);
    #[async_trait]
    impl LiveCounter for FixedLiveCounter {
        async fn current_count(&self, _action: UsageAction) -> u64 {
            self.0
        }
    }

    struct RecordingSink {
        total: AtomicU64,
        commits: AtomicI64,
    }
    #[async_trait]
    impl UsageSink for RecordingSink {
        async fn commit(&self, _action: UsageAction, delta: i64) -> Result<(), String> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            if delta > 0 {
                self.total.fetch_add(delta as u64, Ordering::SeqCst);
            } else {
                self.total.fetch_sub((-delta) as u64, Ordering::SeqCst);
            }
            Ok(())
        }
        async fn cached_total(&self, _action: UsageAction) -> u64 {
            self.total.load(Ordering::SeqCst)
        }
    }

    fn guardrail(status: Option<BillingPeriodStatus>, sink: Arc<RecordingSink>) -> UsageGuardrail {
        UsageGuardrail::new(
            PlanLimits {
                max_entities: Some(150),
                max_queries: Some(10),
                max_source_connections: Some(3),
                max_team_members: Some(2),
            },
            status,
            Box::new(FixedLiveCounter(2)),
            Box::new(sink),
        )
    }

    #[tokio::test]
    async fn no_billing_record_exempts_all_checks() {
        let sink = Arc::new(RecordingSink { total: AtomicU64::new(1_000), commits: AtomicI64::new(0) });
        let g = guardrail(None, sink);
        assert!(g.is_allowed(UsageAction::Entities, 1_000_000).await.is_ok());
    }

    #[tokio::test]
    async fn grace_period_blocks_source_connections_only() {
        let sink = Arc::new(RecordingSink { total: AtomicU64::new(0), commits: AtomicI64::new(0) });
        let g = guardrail(Some(BillingPeriodStatus::Grace), sink);
        assert!(matches!(
            g.is_allowed(UsageAction::SourceConnections, 1).await,
            Err(UsageError::PaymentRequired { .. })
        ));
        assert!(g.is_allowed(UsageAction::Queries, 1).await.is_ok());
    }

    #[tokio::test]
    async fn dynamic_metric_blocks_over_limit() {
        let sink = Arc::new(RecordingSink { total: AtomicU64::new(0), commits: AtomicI64::new(0) });
        let g = guardrail(Some(BillingPeriodStatus::Active), sink);
        // live count fixed at 2, limit 2 for team_members.
        let err = g.is_allowed(UsageAction::TeamMembers, 1).await.unwrap_err();
        assert!(matches!(err, UsageError::LimitExceeded { .. }));
    }

    #[tokio::test]
    async fn cumulative_increment_auto_flushes_at_threshold() {
        let sink = Arc::new(RecordingSink { total: AtomicU64::new(0), commits: AtomicI64::new(0) });
        let g = guardrail(Some(BillingPeriodStatus::Active), sink.clone());
        // queries flush threshold is 1, so a single increment triggers a flush.
        g.increment(UsageAction::Queries, 1).await.unwrap();
        assert_eq!(sink.commits.load(Ordering::SeqCst), 1);
        assert_eq!(sink.total.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn flush_all_commits_every_pending_action() {
        let sink = Arc::new(RecordingSink { total: AtomicU64::new(0), commits: AtomicI64::new(0) });
        let g = guardrail(Some(BillingPeriodStatus::Active), sink.clone());
        g.adjust(UsageAction::Entities, 5).await.unwrap();
        assert_eq!(sink.commits.load(Ordering::SeqCst), 0, "below threshold, not yet flushed");
        g.flush_all().await.unwrap();
        assert_eq!(sink.commits.load(Ordering::SeqCst), 1);
        assert_eq!(sink.total.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn cumulative_limit_accounts_for_pending_increments() {
        let sink = Arc::new(RecordingSink { total: AtomicU64::new(140), commits: AtomicI64::new(0) });
        let g = guardrail(Some(BillingPeriodStatus::Active), sink);
        // Prime the cache with the current total, then buffer under threshold.
        assert!(g.is_allowed(UsageAction::Entities, 5).await.is_ok());
        g.adjust(UsageAction::Entities, 8).await.unwrap();
        let err = g.is_allowed(UsageAction::Entities, 5).await.unwrap_err();
        assert!(matches!(err, UsageError::LimitExceeded { .. }));
    }
}
