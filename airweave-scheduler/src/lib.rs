//! Durable task executor abstraction: one workflow execution per SyncJob,
//! cooperative cancellation, and cron/interval schedule validation for
//! recurring Sync definitions.

pub mod error;
pub mod job;
pub mod schedule;

pub mod prelude {
    pub use crate::error::SchedulerError;
    pub use crate::job::{workflow_id, JobExecutor, JobRegistry, JobStatus, SyncWorkflow};
    pub use crate::schedule::ScheduleConfig;
}
