//! Organization lifecycle saga: identity provider + payments + local
//! database, with explicit compensation on partial failure.

pub mod error;
pub mod model;
pub mod providers;
pub mod saga;

pub mod prelude {
    pub use crate::error::OrgSagaError;
    pub use crate::model::{ApiKeyRecord, BillingRecord, MembershipRecord, NewOrganization, OrganizationRecord};
    pub use crate::providers::{IdentityProvider, PaymentsProvider, WebhookTenant};
    pub use crate::saga::OrganizationSaga;
}
