//! Per-request authentication, organization resolution, access control,
//! and rate limiting, producing the `ApiContext` the rest of the stack
//! consumes.

pub mod auth_source;
pub mod error;
pub mod model;
pub mod resolver;

pub mod prelude {
    pub use crate::auth_source::{
        ApiKeyDirectory, IdentityProviderClaims, IncomingAuth, IncomingRequest, OrganizationDirectory, UserDirectory,
    };
    pub use crate::error::ContextError;
    pub use crate::model::{ApiContext, ApiKey, AuthMethod, Organization, RequestMeta, User};
    pub use crate::resolver::ContextResolver;
}
