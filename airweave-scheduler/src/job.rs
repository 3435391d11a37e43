//! One workflow execution per SyncJob, identified as `sync-{job_id}`,
//! with cooperative cancellation via one `CancellationToken` per job.

use crate::error::SchedulerError;
use airweave_core::types::SyncJobId;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelling,
    Cancelled,
}

/// Workflow identity, `sync-{job_id}` per the concurrency model.
pub fn workflow_id(job_id: SyncJobId) -> String {
    format!("sync-{job_id}")
}

#[async_trait]
pub trait SyncWorkflow: Send + Sync {
    async fn run(&self, cancel: CancellationToken) -> Result<(), String>;
}

struct JobEntry {
    status: JobStatus,
    cancel: CancellationToken,
}

/// Tracks one cancellation token and status per in-flight job. Cheaply
/// cloneable; shared across whatever drives the executor.
#[derive(Clone)]
pub struct JobRegistry {
    jobs: Arc<DashMap<String, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
        }
    }

    pub fn status(&self, job_id: SyncJobId) -> Option<JobStatus> {
        self.jobs.get(&workflow_id(job_id)).map(|e| e.status)
    }

    /// Flips a PENDING or RUNNING job to CANCELLING and signals its token.
    /// Cooperative: the workflow itself must observe `cancel.is_cancelled()`
    /// at its suspension points and finish the in-flight batch before
    /// transitioning to CANCELLED.
    pub fn request_cancel(&self, job_id: SyncJobId) -> Result<(), SchedulerError> {
        let key = workflow_id(job_id);
        let mut entry = self
            .jobs
            .get_mut(&key)
            .ok_or_else(|| SchedulerError::NotFound(key.clone()))?;
        entry.status = JobStatus::Cancelling;
        entry.cancel.cancel();
        Ok(())
    }

    fn register(&self, job_id: SyncJobId) -> CancellationToken {
        let cancel = CancellationToken::new();
        self.jobs.insert(
            workflow_id(job_id),
            JobEntry {
                status: JobStatus::Pending,
                cancel: cancel.clone(),
            },
        );
        cancel
    }

    fn set_status(&self, job_id: SyncJobId, status: JobStatus) {
        if let Some(mut entry) = self.jobs.get_mut(&workflow_id(job_id)) {
            entry.status = status;
        }
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns one workflow execution for `job_id`, driving its status through
/// PENDING -> RUNNING -> {COMPLETED | FAILED | CANCELLED}.
pub struct JobExecutor {
    registry: JobRegistry,
}

impl JobExecutor {
    pub fn new(registry: JobRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub async fn spawn(&self, job_id: SyncJobId, workflow: Arc<dyn SyncWorkflow>) -> Result<(), SchedulerError> {
        let key = workflow_id(job_id);
        if self.registry.jobs.contains_key(&key) {
            return Err(SchedulerError::AlreadyRunning(key));
        }
        let cancel = self.registry.register(job_id);
        let registry = self.registry.clone();

        tokio::spawn(async move {
            registry.set_status(job_id, JobStatus::Running);
            let outcome = workflow.run(cancel.clone()).await;
            let final_status = match outcome {
                Ok(()) if cancel.is_cancelled() => JobStatus::Cancelled,
                Ok(()) => JobStatus::Completed,
                Err(ref err) => {
                    tracing::warn!(job_id = %job_id, error = %err, "sync workflow failed");
                    JobStatus::Failed
                }
            };
            registry.set_status(job_id, final_status);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ImmediateSuccess;
    #[async_trait]
    impl SyncWorkflow for ImmediateSuccess {
        async fn run(&self, _cancel: CancellationToken) -> Result<(), String> {
            Ok(())
        }
    }

    struct ImmediateFailure;
    #[async_trait]
    impl SyncWorkflow for ImmediateFailure {
        async fn run(&self, _cancel: CancellationToken) -> Result<(), String> {
            Err("boom".to_string())
        }
    }

    struct WaitsForCancel(Arc<AtomicBool>);
    #[async_trait]
    impl SyncWorkflow for WaitsForCancel {
        async fn run(&self, cancel: CancellationToken) -> Result<(), String> {
            cancel.cancelled().await;
            self.0.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn successful_workflow_reaches_completed() {
        let registry = JobRegistry::new();
        let executor = JobExecutor::new(registry.clone());
        let job_id = SyncJobId::new();
        executor.spawn(job_id, Arc::new(ImmediateSuccess)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(registry.status(job_id), Some(JobStatus::Completed));
    }

    #[tokio::test]
    async fn failing_workflow_reaches_failed() {
        let registry = JobRegistry::new();
        let executor = JobExecutor::new(registry.clone());
        let job_id = SyncJobId::new();
        executor.spawn(job_id, Arc::new(ImmediateFailure)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(registry.status(job_id), Some(JobStatus::Failed));
    }

    #[tokio::test]
    async fn cancel_request_flips_status_and_signals_token() {
        let registry = JobRegistry::new();
        let executor = JobExecutor::new(registry.clone());
        let job_id = SyncJobId::new();
        let observed = Arc::new(AtomicBool::new(false));
        executor
            .spawn(job_id, Arc::new(WaitsForCancel(observed.clone())))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(registry.status(job_id), Some(JobStatus::Running));

        registry.request_cancel(job_id).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(observed.load(Ordering::SeqCst));
        assert_eq!(registry.status(job_id), Some(JobStatus::Cancelled));
    }

    #[tokio::test]
    async fn duplicate_spawn_for_same_job_id_rejected() {
        let registry = JobRegistry::new();
        let executor = JobExecutor::new(registry);
        let job_id = SyncJobId::new();
        executor.spawn(job_id, Arc::new(ImmediateSuccess)).await.unwrap();
        let err = executor.spawn(job_id, Arc::new(ImmediateSuccess)).await.unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyRunning(_)));
    }

    #[test]
    fn cancelling_unknown_job_errors() {
        let registry = JobRegistry::new();
        let err = registry.request_cancel(SyncJobId::new()).unwrap_err();
        assert!(matches!(err, SchedulerError::NotFound(_)));
    }
}
