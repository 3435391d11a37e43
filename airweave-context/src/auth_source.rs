//! Pluggable lookups the resolver needs but does not own: identity-provider
//! user resolution, API key lookup, organization fetch. A production
//! deployment backs these with Postgres repositories; tests use fakes.

use crate::model::{ApiKey, Organization, User};
use airweave_core::types::{OrganizationId, UserId};
use async_trait::async_trait;

/// Bearer-token claims already verified by whatever JWT layer sits in
/// front of the resolver (signature + blacklist are checked upstream via
/// `airweave_cache::is_token_blacklisted`).
#[derive(Debug, Clone)]
pub struct IdentityProviderClaims {
    pub user_id: UserId,
    pub email: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn load_or_create(&self, claims: &IdentityProviderClaims) -> Result<User, String>;
    async fn touch_last_active(&self, user_id: UserId);
}

#[async_trait]
pub trait ApiKeyDirectory: Send + Sync {
    async fn lookup(&self, key_hash: &str) -> Option<ApiKey>;
}

#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    async fn get(&self, id: OrganizationId) -> Option<Organization>;
}

/// What the caller presented, before resolution.
pub enum IncomingAuth {
    Disabled { first_superuser_email: String },
    IdentityProvider(IdentityProviderClaims),
    ApiKey { key_hash: String },
    None,
}

/// Parsed request-level inputs the resolver needs beyond the auth
/// presentation itself.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub explicit_organization_id: Option<OrganizationId>,
    pub client_name: Option<String>,
    pub sdk_name: Option<String>,
    pub sdk_version: Option<String>,
    pub session_id: Option<String>,
}
