//! `airweave-events` — in-process topic fan-out to subscribers.
//! Organization lifecycle events and sync-progress notifications are
//! both published here.
//!
//! Semaphore-bounded concurrency, dotted string topics with `*`
//! single-segment wildcard subscriptions (e.g. `org.*` matches
//! `org.created` and `org.deleted`).

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};

pub const DEFAULT_MAX_CONCURRENCY: usize = 1024;

/// A published event: a dotted topic plus a JSON payload.
#[derive(Debug, Clone)]
pub struct Event {
    pub topic: String,
    pub payload: Value,
}

type Handler = Arc<dyn Fn(Event) -> futures_box::BoxFuture + Send + Sync>;

mod futures_box {
    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
}

/// Split a topic or pattern into `.`-delimited segments.
fn segments(s: &str) -> Vec<&str> {
    s.split('.').collect()
}

/// Does `pattern` match `topic`? `*` matches exactly one segment; a
/// trailing `**` segment matches any number of remaining segments.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let pat = segments(pattern);
    let top = segments(topic);

    let mut pi = 0;
    let mut ti = 0;
    while pi < pat.len() {
        if pat[pi] == "**" {
            return true; // matches the rest, regardless of remaining length
        }
        if ti >= top.len() {
            return false;
        }
        if pat[pi] != "*" && pat[pi] != top[ti] {
            return false;
        }
        pi += 1;
        ti += 1;
    }
    pi == pat.len() && ti == top.len()
}

/// In-process event bus with topic-pattern pub/sub and bounded concurrency.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<(String, Handler)>>>,
    semaphore: Option<Arc<Semaphore>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_concurrency(DEFAULT_MAX_CONCURRENCY)
    }

    pub fn with_concurrency(max_concurrent: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            semaphore: Some(Arc::new(Semaphore::new(max_concurrent))),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            semaphore: None,
        }
    }

    /// Subscribe to a topic pattern (e.g. `"sync.progress"`, `"org.*"`,
    /// `"acl.**"`).
    pub async fn subscribe<F, Fut>(&self, pattern: impl Into<String>, handler: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |event| Box::pin(handler(event)));
        let mut subs = self.subscribers.write().await;
        subs.push((pattern.into(), handler));
    }

    /// Publish an event, spawning matching subscribers as concurrent tasks.
    /// Returns once all matching handlers have been spawned (not awaited).
    pub async fn emit(&self, topic: impl Into<String>, payload: Value) {
        let event = Event {
            topic: topic.into(),
            payload,
        };
        let subs = self.subscribers.read().await;
        for (pattern, handler) in subs.iter() {
            if !topic_matches(pattern, &event.topic) {
                continue;
            }
            let h = handler.clone();
            let e = event.clone();
            match &self.semaphore {
                Some(sem) => {
                    let permit = sem.clone().acquire_owned().await.expect("semaphore closed");
                    tokio::spawn(async move {
                        h(e).await;
                        drop(permit);
                    });
                }
                None => {
                    tokio::spawn(async move {
                        h(e).await;
                    });
                }
            }
        }
    }

    /// Publish and wait for every matching handler to complete.
    pub async fn emit_and_wait(&self, topic: impl Into<String>, payload: Value) {
        let event = Event {
            topic: topic.into(),
            payload,
        };
        let subs = self.subscribers.read().await;
        let mut tasks = Vec::new();
        for (pattern, handler) in subs.iter() {
            if !topic_matches(pattern, &event.topic) {
                continue;
            }
            let h = handler.clone();
            let e = event.clone();
            match &self.semaphore {
                Some(sem) => {
                    let permit = sem.clone().acquire_owned().await.expect("semaphore closed");
                    tasks.push(tokio::spawn(async move {
                        h(e).await;
                        drop(permit);
                    }));
                }
                None => {
                    tasks.push(tokio::spawn(async move {
                        h(e).await;
                    }));
                }
            }
        }
        for task in tasks {
            let _ = task.await;
        }
    }

    pub async fn clear(&self) {
        self.subscribers.write().await.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Well-known topics published by the organization saga and the sync
/// pipeline.
pub mod topics {
    pub const ORGANIZATION_CREATED: &str = "org.created";
    pub const ORGANIZATION_DELETED: &str = "org.deleted";
    pub const SYNC_PROGRESS: &str = "sync.progress";
    pub const SYNC_ENTITY_COUNTS: &str = "sync.entity_counts";
    pub const SEARCH_PROGRESS: &str = "search.progress";
}
