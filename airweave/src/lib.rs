//! Airweave — a single facade over the sync, ACL, credential, and
//! organization-lifecycle sub-crates.
//!
//! Depend on this crate and enable the features you need instead of
//! depending on each `airweave-*` crate directly:
//!
//! ```ignore
//! use airweave::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature       | Default | Crate                |
//! |---------------|---------|----------------------|
//! | `cache`       | **yes** | `airweave-cache`     |
//! | `rate-limit`  | **yes** | `airweave-rate-limit`|
//! | `events`      | **yes** | `airweave-events`    |
//! | `data`        | **yes** | `airweave-data`      |
//! | `credentials` | **yes** | `airweave-credentials`|
//! | `oauth`       | no      | `airweave-oauth`     |
//! | `acl`         | no      | `airweave-acl`       |
//! | `usage`       | no      | `airweave-usage`     |
//! | `source`      | no      | `airweave-source`    |
//! | `pipeline`    | no      | `airweave-pipeline`  |
//! | `scheduler`   | no      | `airweave-scheduler` |
//! | `context`     | no      | `airweave-context`   |
//! | `orgs`        | no      | `airweave-orgs`      |
//! | `search`      | no      | `airweave-search`    |
//! | `full`        | no      | All of the above     |

pub extern crate airweave_core;

#[cfg(feature = "cache")]
pub use airweave_cache;

#[cfg(feature = "rate-limit")]
pub use airweave_rate_limit;

#[cfg(feature = "events")]
pub use airweave_events;

#[cfg(feature = "data")]
pub use airweave_data;

#[cfg(feature = "credentials")]
pub use airweave_credentials;

#[cfg(feature = "oauth")]
pub use airweave_oauth;

#[cfg(feature = "acl")]
pub use airweave_acl;

#[cfg(feature = "usage")]
pub use airweave_usage;

#[cfg(feature = "source")]
pub use airweave_source;

#[cfg(feature = "pipeline")]
pub use airweave_pipeline;

#[cfg(feature = "scheduler")]
pub use airweave_scheduler;

#[cfg(feature = "context")]
pub use airweave_context;

#[cfg(feature = "orgs")]
pub use airweave_orgs;

#[cfg(feature = "search")]
pub use airweave_search;

#[cfg(all(feature = "pipeline", feature = "source", feature = "events", feature = "credentials"))]
pub mod orchestrator;

pub use airweave_core::*;

pub mod prelude {
    pub use airweave_core::prelude::*;

    #[cfg(feature = "cache")]
    pub use airweave_cache::{ContextCache, InMemoryBlacklist, TtlCache};

    #[cfg(feature = "rate-limit")]
    pub use airweave_rate_limit::{ProviderRateLimiters, RateLimitDecision, RateLimiter};

    #[cfg(feature = "events")]
    pub use airweave_events::{topics, Event, EventBus};

    #[cfg(feature = "data")]
    pub use airweave_data::prelude::*;

    #[cfg(feature = "credentials")]
    pub use airweave_credentials::prelude::*;

    #[cfg(feature = "oauth")]
    pub use airweave_oauth::prelude::*;

    #[cfg(feature = "acl")]
    pub use airweave_acl::{AclChange, AclStore, AclSyncOutcome, MemberType, MembershipTuple, SyncMode};

    #[cfg(feature = "usage")]
    pub use airweave_usage::prelude::*;

    #[cfg(feature = "source")]
    pub use airweave_source::prelude::*;

    #[cfg(feature = "pipeline")]
    pub use airweave_pipeline::prelude::*;

    #[cfg(feature = "scheduler")]
    pub use airweave_scheduler::prelude::*;

    #[cfg(feature = "context")]
    pub use airweave_context::prelude::*;

    #[cfg(feature = "orgs")]
    pub use airweave_orgs::prelude::*;

    #[cfg(feature = "search")]
    pub use airweave_search::prelude::*;

    #[cfg(all(feature = "pipeline", feature = "source", feature = "events", feature = "credentials"))]
    pub use crate::orchestrator::SyncOrchestrator;
}
