//! Request -> auth -> org -> access check -> rate limit -> `ApiContext`.
//!
//! Layered validation over a pluggable `AuthSource`, backed by a
//! short-TTL org/user/api-key cache and a per-organization rate
//! limiter for the request budget.

use crate::auth_source::{ApiKeyDirectory, IncomingAuth, IncomingRequest, OrganizationDirectory, UserDirectory};
use crate::error::ContextError;
use crate::model::{ApiContext, AuthMethod, Organization, RequestMeta, User};
use airweave_cache::ContextCache;
use airweave_core::types::OrganizationId;
use airweave_rate_limit::{RateLimitDecision, RateLimiter};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub struct ContextResolver {
    users: Arc<dyn UserDirectory>,
    api_keys: Arc<dyn ApiKeyDirectory>,
    orgs: Arc<dyn OrganizationDirectory>,
    cache: ContextCache,
    api_key_rate_limiter: RateLimiter<OrganizationId>,
}

impl ContextResolver {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        api_keys: Arc<dyn ApiKeyDirectory>,
        orgs: Arc<dyn OrganizationDirectory>,
        cache: ContextCache,
        max_requests_per_window: u64,
        window: Duration,
    ) -> Self {
        Self {
            users,
            api_keys,
            orgs,
            cache,
            api_key_rate_limiter: RateLimiter::new(max_requests_per_window, window),
        }
    }

    pub async fn resolve(&self, auth: IncomingAuth, request: IncomingRequest) -> Result<ApiContext, ContextError> {
        let (user, auth_method, api_key_org) = self.authenticate(auth).await?;

        let organization_id = self.resolve_organization_id(&request, &user, api_key_org)?;
        let organization = self.fetch_organization(organization_id).await?;
        self.check_access(&user, auth_method, &organization, api_key_org)?;

        let rate_limit = self.check_rate_limit(auth_method, organization_id);
        if !rate_limit.allowed {
            return Err(ContextError::RateLimited {
                retry_after_secs: rate_limit.retry_after_secs,
            });
        }

        Ok(ApiContext {
            request_id: Uuid::new_v4().to_string(),
            organization,
            user,
            auth_method,
            request_meta: RequestMeta {
                client_name: request.client_name,
                sdk_name: request.sdk_name,
                sdk_version: request.sdk_version,
                session_id: request.session_id,
            },
            rate_limit,
        })
    }

    async fn authenticate(
        &self,
        auth: IncomingAuth,
    ) -> Result<(Option<User>, AuthMethod, Option<OrganizationId>), ContextError> {
        match auth {
            IncomingAuth::Disabled { first_superuser_email } => {
                let system_user = User {
                    id: airweave_core::types::UserId::new(),
                    email: first_superuser_email,
                    primary_organization_id: None,
                    memberships: Vec::new(),
                    last_active_at: None,
                };
                Ok((Some(system_user), AuthMethod::System, None))
            }
            IncomingAuth::IdentityProvider(claims) => {
                let user = self
                    .users
                    .load_or_create(&claims)
                    .await
                    .map_err(|_| ContextError::NoValidAuthentication)?;
                self.users.touch_last_active(user.id).await;
                Ok((Some(user), AuthMethod::OauthUser, None))
            }
            IncomingAuth::ApiKey { key_hash } => {
                if let Some(cached_org) = self.cache.api_key_org(&key_hash) {
                    return Ok((None, AuthMethod::ApiKey, Some(cached_org)));
                }
                let api_key = self.api_keys.lookup(&key_hash).await.ok_or(ContextError::InvalidApiKey)?;
                if !api_key.is_valid(Utc::now()) {
                    return Err(ContextError::InvalidApiKey);
                }
                self.cache.cache_api_key_org(key_hash, api_key.organization_id);
                Ok((None, AuthMethod::ApiKey, Some(api_key.organization_id)))
            }
            IncomingAuth::None => Err(ContextError::NoValidAuthentication),
        }
    }

    fn resolve_organization_id(
        &self,
        request: &IncomingRequest,
        user: &Option<User>,
        api_key_org: Option<OrganizationId>,
    ) -> Result<OrganizationId, ContextError> {
        if let Some(explicit) = request.explicit_organization_id {
            return Ok(explicit);
        }
        if let Some(primary) = user.as_ref().and_then(|u| u.primary_organization_id) {
            return Ok(primary);
        }
        if let Some(org) = api_key_org {
            return Ok(org);
        }
        Err(ContextError::OrganizationContextRequired)
    }

    async fn fetch_organization(&self, id: OrganizationId) -> Result<Organization, ContextError> {
        self.orgs.get(id).await.ok_or(ContextError::OrganizationNotFound)
    }

    fn check_access(
        &self,
        user: &Option<User>,
        auth_method: AuthMethod,
        organization: &Organization,
        api_key_org: Option<OrganizationId>,
    ) -> Result<(), ContextError> {
        match auth_method {
            AuthMethod::System => Ok(()),
            AuthMethod::OauthUser => {
                let user = user.as_ref().expect("oauth_user auth always carries a User");
                if user.memberships.contains(&organization.id) {
                    Ok(())
                } else {
                    Err(ContextError::OrganizationAccessDenied)
                }
            }
            AuthMethod::ApiKey => {
                if api_key_org == Some(organization.id) {
                    Ok(())
                } else {
                    Err(ContextError::OrganizationAccessDenied)
                }
            }
        }
    }

    /// System and user auth are unlimited; API-key auth is budgeted
    /// per-organization and fails open on a limiter outage.
    fn check_rate_limit(&self, auth_method: AuthMethod, organization_id: OrganizationId) -> RateLimitDecision {
        match auth_method {
            AuthMethod::System | AuthMethod::OauthUser => RateLimitDecision {
                allowed: true,
                retry_after_secs: 0,
                limit: 0,
                remaining: 0,
            },
            AuthMethod::ApiKey => self.api_key_rate_limiter.check(&organization_id),
        }
    }
}
