//! External collaborators the saga orchestrates: identity provider,
//! payments, webhook tenant. Concrete implementations (Auth0/Clerk,
//! Stripe, Svix, ...) are out of scope; these are the contracts the saga
//! drives and compensates against.

use async_trait::async_trait;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_org(&self, name: &str) -> Result<String, String>;
    async fn add_owner(&self, identity_org_id: &str, user_email: &str) -> Result<(), String>;
    async fn enable_default_connections(&self, identity_org_id: &str) -> Result<(), String>;
    async fn delete_org(&self, identity_org_id: &str) -> Result<(), String>;
}

#[async_trait]
pub trait PaymentsProvider: Send + Sync {
    /// `use_test_clock` is set outside production so trial/renewal timers
    /// can be advanced deterministically in tests.
    async fn create_customer(&self, org_name: &str, owner_email: &str, use_test_clock: bool) -> Result<String, String>;
    async fn cancel_subscription(&self, customer_id: &str) -> Result<(), String>;
    async fn delete_customer(&self, customer_id: &str) -> Result<(), String>;
}

#[async_trait]
pub trait WebhookTenant: Send + Sync {
    async fn delete_tenant(&self, identity_org_id: &str) -> Result<(), String>;
}
