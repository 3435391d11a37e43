#[derive(Debug)]
pub enum SchedulerError {
    InvalidCron(String),
    AlreadyRunning(String),
    NotFound(String),
}

impl std::fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::InvalidCron(msg) => write!(f, "invalid cron expression: {msg}"),
            SchedulerError::AlreadyRunning(msg) => write!(f, "job already running: {msg}"),
            SchedulerError::NotFound(msg) => write!(f, "job not found: {msg}"),
        }
    }
}

impl std::error::Error for SchedulerError {}
