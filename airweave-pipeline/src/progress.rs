//! Buffered progress counters for a running sync, plus job termination.

use airweave_core::types::{SyncId, SyncJobId};
use airweave_events::{topics, EventBus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_PUBLISH_THRESHOLD: u32 = 3;
/// Entity-type totals publish on their own cadence, independent of the
/// differential action-counter threshold.
pub const ENTITY_COUNTS_PUBLISH_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKind {
    Inserted,
    Updated,
    Deleted,
    Kept,
    Skipped,
}

const ALL_COUNTER_KINDS: [CounterKind; 5] = [
    CounterKind::Inserted,
    CounterKind::Updated,
    CounterKind::Deleted,
    CounterKind::Kept,
    CounterKind::Skipped,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelling,
    Cancelled,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncCounters {
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
    pub kept: u64,
    pub skipped: u64,
}

impl SyncCounters {
    fn apply(&mut self, kind: CounterKind, amount: u64) {
        match kind {
            CounterKind::Inserted => self.inserted += amount,
            CounterKind::Updated => self.updated += amount,
            CounterKind::Deleted => self.deleted += amount,
            CounterKind::Kept => self.kept += amount,
            CounterKind::Skipped => self.skipped += amount,
        }
    }
}

struct ProgressState {
    totals: SyncCounters,
    pending_by_kind: HashMap<CounterKind, u64>,
    pending_total: u32,
    /// Absolute count per entity type, e.g. `asana_task` -> 412. Inserts
    /// increment, deletes decrement floored at zero, updates/kept/skipped
    /// leave the total unchanged.
    entity_type_counts: HashMap<String, i64>,
    last_entity_counts_publish: Option<Instant>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            totals: SyncCounters::default(),
            pending_by_kind: ALL_COUNTER_KINDS.iter().map(|k| (*k, 0)).collect(),
            pending_total: 0,
            entity_type_counts: HashMap::new(),
            last_entity_counts_publish: None,
        }
    }
}

/// Buffers entity-count increments under an async lock, flushing to the
/// event bus once total pending operations reach a threshold.
pub struct SyncProgress {
    sync_id: SyncId,
    job_id: SyncJobId,
    bus: EventBus,
    threshold: u32,
    state: Mutex<ProgressState>,
}

impl SyncProgress {
    pub fn new(sync_id: SyncId, job_id: SyncJobId, bus: EventBus) -> Self {
        Self::with_threshold(sync_id, job_id, bus, DEFAULT_PUBLISH_THRESHOLD)
    }

    pub fn with_threshold(sync_id: SyncId, job_id: SyncJobId, bus: EventBus, threshold: u32) -> Self {
        Self {
            sync_id,
            job_id,
            bus,
            threshold,
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Records `amount` operations of `kind`, publishing once the buffered
    /// total since the last publish reaches the threshold.
    pub async fn increment(&self, kind: CounterKind, amount: u64) {
        if amount == 0 {
            return;
        }
        let snapshot = {
            let mut state = self.state.lock().await;
            state.totals.apply(kind, amount);
            *state.pending_by_kind.entry(kind).or_insert(0) += amount;
            state.pending_total += 1;
            if state.pending_total >= self.threshold {
                let totals = state.totals.clone();
                state.pending_by_kind.values_mut().for_each(|v| *v = 0);
                state.pending_total = 0;
                Some(totals)
            } else {
                None
            }
        };
        if let Some(totals) = snapshot {
            self.publish_progress(&totals).await;
        }
    }

    /// Records one entity of `entity_type` undergoing `kind`, publishing
    /// the absolute per-type totals once `ENTITY_COUNTS_PUBLISH_INTERVAL`
    /// has elapsed since the last publish.
    pub async fn record_entity_type(&self, entity_type: &str, kind: CounterKind) {
        let snapshot = {
            let mut state = self.state.lock().await;
            let count = state.entity_type_counts.entry(entity_type.to_string()).or_insert(0);
            match kind {
                CounterKind::Inserted => *count += 1,
                CounterKind::Deleted => *count = (*count - 1).max(0),
                CounterKind::Updated | CounterKind::Kept | CounterKind::Skipped => {}
            }
            let due = state
                .last_entity_counts_publish
                .map(|t| t.elapsed() >= ENTITY_COUNTS_PUBLISH_INTERVAL)
                .unwrap_or(true);
            if due {
                state.last_entity_counts_publish = Some(Instant::now());
                Some(state.entity_type_counts.clone())
            } else {
                None
            }
        };
        if let Some(counts) = snapshot {
            self.publish_entity_counts(&counts).await;
        }
    }

    /// Publishes current totals regardless of threshold. Called on
    /// termination so a partial batch is never silently dropped.
    pub async fn flush(&self) {
        let (totals, entity_type_counts) = {
            let mut state = self.state.lock().await;
            state.pending_by_kind.values_mut().for_each(|v| *v = 0);
            state.pending_total = 0;
            state.last_entity_counts_publish = Some(Instant::now());
            (state.totals.clone(), state.entity_type_counts.clone())
        };
        self.publish_progress(&totals).await;
        self.publish_entity_counts(&entity_type_counts).await;
    }

    async fn publish_progress(&self, totals: &SyncCounters) {
        self.bus
            .emit(
                topics::SYNC_PROGRESS,
                json!({
                    "sync_id": self.sync_id.to_string(),
                    "job_id": self.job_id.to_string(),
                    "inserted": totals.inserted,
                    "updated": totals.updated,
                    "deleted": totals.deleted,
                    "kept": totals.kept,
                    "skipped": totals.skipped,
                }),
            )
            .await;
    }

    /// Publishes absolute entity counts per type, independent of the
    /// differential `SYNC_PROGRESS` topic.
    async fn publish_entity_counts(&self, entity_type_counts: &HashMap<String, i64>) {
        self.bus
            .emit(
                topics::SYNC_ENTITY_COUNTS,
                json!({
                    "sync_id": self.sync_id.to_string(),
                    "job_id": self.job_id.to_string(),
                    "entity_counts": entity_type_counts,
                }),
            )
            .await;
    }

    pub async fn totals(&self) -> SyncCounters {
        self.state.lock().await.totals.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn publishes_once_threshold_reached() {
        let bus = EventBus::unbounded();
        let publishes = Arc::new(AtomicUsize::new(0));
        let counter = publishes.clone();
        bus.subscribe(topics::SYNC_PROGRESS, move |_event| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        let progress = SyncProgress::with_threshold(SyncId::new(), SyncJobId::new(), bus, 3);
        progress.increment(CounterKind::Inserted, 1).await;
        progress.increment(CounterKind::Inserted, 1).await;
        tokio::task::yield_now().await;
        assert_eq!(publishes.load(Ordering::SeqCst), 0);
        progress.increment(CounterKind::Inserted, 1).await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(publishes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn flush_emits_even_below_threshold() {
        let bus = EventBus::unbounded();
        let publishes = Arc::new(AtomicUsize::new(0));
        let counter = publishes.clone();
        bus.subscribe(topics::SYNC_PROGRESS, move |_event| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        let progress = SyncProgress::new(SyncId::new(), SyncJobId::new(), bus);
        progress.increment(CounterKind::Kept, 1).await;
        progress.flush().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(publishes.load(Ordering::SeqCst), 1);
        assert_eq!(progress.totals().await.kept, 1);
    }

    #[tokio::test]
    async fn entity_type_counts_publish_on_their_own_topic() {
        let bus = EventBus::unbounded();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(topics::SYNC_ENTITY_COUNTS, move |event| {
            let sink = sink.clone();
            async move {
                sink.lock().await.push(event.payload);
            }
        })
        .await;

        let progress = SyncProgress::new(SyncId::new(), SyncJobId::new(), bus);
        progress.record_entity_type("asana_task", CounterKind::Inserted).await;
        progress.record_entity_type("asana_task", CounterKind::Inserted).await;
        progress.record_entity_type("asana_project", CounterKind::Inserted).await;
        progress.flush().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let events = seen.lock().await;
        let last = events.last().expect("at least one publish");
        assert_eq!(last["entity_counts"]["asana_task"], 2);
        assert_eq!(last["entity_counts"]["asana_project"], 1);
    }

    #[tokio::test]
    async fn entity_type_counts_floor_at_zero_on_delete() {
        let bus = EventBus::unbounded();
        let progress = SyncProgress::new(SyncId::new(), SyncJobId::new(), bus);
        progress.record_entity_type("asana_task", CounterKind::Deleted).await;
        progress.flush().await;
        assert_eq!(
            progress.state.lock().await.entity_type_counts.get("asana_task").copied(),
            Some(0)
        );
    }
}
