//! Declarative per-plan limits. `None` means unlimited.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageAction {
    Entities,
    Queries,
    SourceConnections,
    TeamMembers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Counted against a running total; cached with a short TTL and buffered.
    Cumulative,
    /// Always counted live from storage — never cached or buffered.
    Dynamic,
}

impl UsageAction {
    pub fn kind(self) -> MetricKind {
        match self {
            UsageAction::Entities | UsageAction::Queries => MetricKind::Cumulative,
            UsageAction::SourceConnections | UsageAction::TeamMembers => MetricKind::Dynamic,
        }
    }

    /// Flush threshold in absolute pending units (only meaningful for
    /// cumulative actions).
    pub fn flush_threshold(self) -> i64 {
        match self {
            UsageAction::Entities => 100,
            UsageAction::Queries => 1,
            UsageAction::SourceConnections | UsageAction::TeamMembers => i64::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanLimits {
    pub max_entities: Option<u64>,
    pub max_queries: Option<u64>,
    pub max_source_connections: Option<u64>,
    pub max_team_members: Option<u64>,
}

impl PlanLimits {
    pub fn limit_for(&self, action: UsageAction) -> Option<u64> {
        match action {
            UsageAction::Entities => self.max_entities,
            UsageAction::Queries => self.max_queries,
            UsageAction::SourceConnections => self.max_source_connections,
            UsageAction::TeamMembers => self.max_team_members,
        }
    }
}

pub const DEVELOPER_PLAN: PlanLimits = PlanLimits {
    max_entities: Some(50_000),
    max_queries: Some(500),
    max_source_connections: Some(5),
    max_team_members: Some(1),
};

pub const PRO_PLAN: PlanLimits = PlanLimits {
    max_entities: Some(1_000_000),
    max_queries: Some(10_000),
    max_source_connections: Some(25),
    max_team_members: Some(5),
};

pub const TEAM_PLAN: PlanLimits = PlanLimits {
    max_entities: Some(10_000_000),
    max_queries: Some(100_000),
    max_source_connections: Some(100),
    max_team_members: Some(25),
};

pub const ENTERPRISE_PLAN: PlanLimits = PlanLimits {
    max_entities: None,
    max_queries: None,
    max_source_connections: None,
    max_team_members: None,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingPeriodStatus {
    Active,
    Grace,
    EndedUnpaid,
    Completed,
}

/// Which actions a billing-period status blocks outright, independent of
/// any numeric limit.
pub fn blocked_actions(status: BillingPeriodStatus) -> &'static [UsageAction] {
    match status {
        BillingPeriodStatus::Active => &[],
        BillingPeriodStatus::Grace => &[UsageAction::SourceConnections],
        BillingPeriodStatus::EndedUnpaid => &[UsageAction::Entities, UsageAction::SourceConnections],
        BillingPeriodStatus::Completed => &[
            UsageAction::Entities,
            UsageAction::Queries,
            UsageAction::SourceConnections,
            UsageAction::TeamMembers,
        ],
    }
}
