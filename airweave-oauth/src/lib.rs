pub mod client;
pub mod error;
pub mod pkce;
pub mod service;
pub mod session;

pub use client::{
    InMemorySettingsRegistry, IntegrationSettings, IntegrationSettingsRegistry,
    ReqwestTokenExchanger, TokenExchanger, TokenResponse,
};
pub use error::OAuthError;
pub use pkce::{generate_pkce, generate_redirect_code, generate_state, Pkce};
pub use service::{OAuthCompletionResult, OAuthService, CALLBACK_PATH};
pub use session::{
    ConnectionInitSession, ConnectionInitSessionStatus, Overrides, RedirectSession,
};

pub mod prelude {
    pub use crate::client::{
        IntegrationSettings, IntegrationSettingsRegistry, TokenExchanger, TokenResponse,
    };
    pub use crate::error::OAuthError;
    pub use crate::service::{OAuthCompletionResult, OAuthService};
    pub use crate::session::{ConnectionInitSession, ConnectionInitSessionStatus, Overrides};
}
