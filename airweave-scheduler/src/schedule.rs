//! Recurring schedule validation for a Sync definition.

use crate::error::SchedulerError;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleConfig {
    /// Run exactly once, as soon as the executor picks it up.
    Once,
    Interval(Duration),
    /// Standard (seconds-first, six-field) cron expression.
    Cron(String),
}

impl ScheduleConfig {
    /// Validates the schedule without constructing a runtime driver for it —
    /// the validation path a `POST /source-connections` cron field would go
    /// through before the job is ever enqueued.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        match self {
            ScheduleConfig::Once => Ok(()),
            ScheduleConfig::Interval(d) if d.is_zero() => {
                Err(SchedulerError::InvalidCron("interval must be non-zero".into()))
            }
            ScheduleConfig::Interval(_) => Ok(()),
            ScheduleConfig::Cron(expr) => cron::Schedule::from_str(expr)
                .map(|_| ())
                .map_err(|e| SchedulerError::InvalidCron(e.to_string())),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ScheduleConfig::Once => "once".to_string(),
            ScheduleConfig::Interval(d) => format!("every {}s", d.as_secs()),
            ScheduleConfig::Cron(expr) => format!("cron: {expr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_cron_expression_passes() {
        let cfg = ScheduleConfig::Cron("0 */5 * * * *".to_string());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn malformed_cron_expression_is_rejected() {
        let cfg = ScheduleConfig::Cron("not a cron".to_string());
        assert!(matches!(cfg.validate(), Err(SchedulerError::InvalidCron(_))));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = ScheduleConfig::Interval(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }
}
