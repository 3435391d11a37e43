use crate::plans::UsageAction;

#[derive(Debug)]
pub enum UsageError {
    PaymentRequired { action: UsageAction },
    LimitExceeded {
        action: UsageAction,
        current: u64,
        amount: u64,
        limit: u64,
    },
    FlushFailed { action: UsageAction, reason: String },
}

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UsageError::PaymentRequired { action } => {
                write!(f, "payment required: action {action:?} blocked by billing status")
            }
            UsageError::LimitExceeded { action, current, amount, limit } => {
                write!(f, "usage limit exceeded for {action:?}: {current}+{amount} > {limit}")
            }
            UsageError::FlushFailed { action, reason } => write!(f, "flush failed for {action:?}: {reason}"),
        }
    }
}

impl std::error::Error for UsageError {}
