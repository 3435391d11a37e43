//! Provider configuration lookup and token exchange.

use crate::error::OAuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Static per-integration OAuth configuration, looked up by `short_name`
/// (e.g. "slack", "google_drive").
#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub short_name: String,
    pub authorize_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub supports_refresh: bool,
    pub requires_pkce: bool,
    /// Present only for OAuth1 integrations.
    pub request_token_url: Option<String>,
}

/// Declarative catalog of configured integrations.
pub trait IntegrationSettingsRegistry: Send + Sync {
    fn lookup(&self, short_name: &str) -> Option<IntegrationSettings>;
}

#[derive(Default)]
pub struct InMemorySettingsRegistry {
    entries: HashMap<String, IntegrationSettings>,
}

impl InMemorySettingsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, settings: IntegrationSettings) -> Self {
        self.entries.insert(settings.short_name.clone(), settings);
        self
    }
}

impl IntegrationSettingsRegistry for InMemorySettingsRegistry {
    fn lookup(&self, short_name: &str) -> Option<IntegrationSettings> {
        self.entries.get(short_name).cloned()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: String,
}

/// Exchanges authorization artifacts for provider tokens. Implementations
/// never log `access_token`, `refresh_token`, or the OAuth1 verifier.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange_oauth2(
        &self,
        settings: &IntegrationSettings,
        code: &str,
        code_verifier: Option<&str>,
        client_id_override: Option<&str>,
        client_secret_override: Option<&str>,
    ) -> Result<TokenResponse, OAuthError>;

    async fn exchange_oauth1(
        &self,
        settings: &IntegrationSettings,
        oauth_token: &str,
        oauth_token_secret: &str,
        verifier: &str,
        consumer_key_override: Option<&str>,
        consumer_secret_override: Option<&str>,
    ) -> Result<TokenResponse, OAuthError>;

    async fn request_oauth1_token(
        &self,
        settings: &IntegrationSettings,
        consumer_key_override: Option<&str>,
        consumer_secret_override: Option<&str>,
    ) -> Result<(String, String), OAuthError>;
}

/// Real `reqwest`-backed exchanger, posting standard `application/
/// x-www-form-urlencoded` grant requests.
pub struct ReqwestTokenExchanger {
    http: reqwest::Client,
}

impl ReqwestTokenExchanger {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TokenExchanger for ReqwestTokenExchanger {
    async fn exchange_oauth2(
        &self,
        settings: &IntegrationSettings,
        code: &str,
        code_verifier: Option<&str>,
        client_id_override: Option<&str>,
        client_secret_override: Option<&str>,
    ) -> Result<TokenResponse, OAuthError> {
        let client_id = client_id_override.unwrap_or(&settings.client_id);
        let client_secret = client_secret_override.unwrap_or(&settings.client_secret);

        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        if let Some(verifier) = code_verifier {
            form.push(("code_verifier", verifier));
        }

        let response = self
            .http
            .post(&settings.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::TokenExchangeFailed(format!(
                "provider returned {}",
                response.status()
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))
    }

    async fn exchange_oauth1(
        &self,
        settings: &IntegrationSettings,
        oauth_token: &str,
        oauth_token_secret: &str,
        verifier: &str,
        consumer_key_override: Option<&str>,
        consumer_secret_override: Option<&str>,
    ) -> Result<TokenResponse, OAuthError> {
        let _ = (
            oauth_token_secret,
            consumer_key_override,
            consumer_secret_override,
        );
        let form = vec![("oauth_token", oauth_token), ("oauth_verifier", verifier)];
        let response = self
            .http
            .post(&settings.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::TokenExchangeFailed(format!(
                "provider returned {}",
                response.status()
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))
    }

    async fn request_oauth1_token(
        &self,
        settings: &IntegrationSettings,
        consumer_key_override: Option<&str>,
        consumer_secret_override: Option<&str>,
    ) -> Result<(String, String), OAuthError> {
        let _ = (consumer_key_override, consumer_secret_override);
        let url = settings
            .request_token_url
            .as_ref()
            .ok_or_else(|| OAuthError::NotConfigured(settings.short_name.clone()))?;

        let response = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let parsed: HashMap<String, String> = url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect();
        let token = parsed
            .get("oauth_token")
            .ok_or_else(|| OAuthError::TokenExchangeFailed("missing oauth_token".into()))?
            .clone();
        let secret = parsed
            .get("oauth_token_secret")
            .ok_or_else(|| OAuthError::TokenExchangeFailed("missing oauth_token_secret".into()))?
            .clone();
        Ok((token, secret))
    }
}
