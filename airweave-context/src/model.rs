//! Minimal request-scoped domain shapes. The concrete relational schema is
//! out of scope; these are the fields the resolver actually touches.

use airweave_core::types::{OrganizationId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub primary_organization_id: Option<OrganizationId>,
    pub memberships: Vec<OrganizationId>,
    pub last_active_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ApiKey {
    pub key_hash: String,
    pub organization_id: OrganizationId,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked: bool,
}

impl ApiKey {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && self.expires_at.map(|exp| exp > now).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    System,
    OauthUser,
    ApiKey,
}

/// Parsed request metadata carried alongside the resolved context
/// (`client_name`, `sdk_name`, `session_id`, ...).
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub client_name: Option<String>,
    pub sdk_name: Option<String>,
    pub sdk_version: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiContext {
    pub request_id: String,
    pub organization: Organization,
    pub user: Option<User>,
    pub auth_method: AuthMethod,
    pub request_meta: RequestMeta,
    pub rate_limit: airweave_rate_limit::RateLimitDecision,
}
