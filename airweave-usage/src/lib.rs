pub mod error;
pub mod guardrail;
pub mod plans;

pub use error::UsageError;
pub use guardrail::{LiveCounter, UsageGuardrail, UsageSink};
pub use plans::{
    blocked_actions, BillingPeriodStatus, MetricKind, PlanLimits, UsageAction, DEVELOPER_PLAN,
    ENTERPRISE_PLAN, PRO_PLAN, TEAM_PLAN,
};

pub mod prelude {
    pub use crate::error::UsageError;
    pub use crate::guardrail::{LiveCounter, UsageGuardrail, UsageSink};
    pub use crate::plans::{BillingPeriodStatus, PlanLimits, UsageAction};
}
