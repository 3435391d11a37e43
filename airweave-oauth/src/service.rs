//! Ties settings lookup, session bookkeeping, and token exchange into the
//! init → proxy-redirect → callback flow.

use crate::client::{IntegrationSettingsRegistry, TokenExchanger, TokenResponse};
use crate::error::OAuthError;
use crate::pkce::{generate_pkce, generate_redirect_code, generate_state};
use crate::session::{ConnectionInitSession, ConnectionInitSessionStatus, Overrides, RedirectSession};
use airweave_data::{InMemoryRepository, Repository};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub const CALLBACK_PATH: &str = "/source-connections/callback";

/// Returned to the caller once a callback has been exchanged; the caller
/// is responsible for finalizing connection creation (writing the
/// `IntegrationCredential` and `Connection` rows).
#[derive(Debug, Clone)]
pub struct OAuthCompletionResult {
    pub token_response: TokenResponse,
    pub init_session: ConnectionInitSession,
    pub original_payload: serde_json::Value,
    pub overrides: Overrides,
    pub short_name: String,
    pub organization_id: Uuid,
}

pub struct OAuthService {
    registry: Arc<dyn IntegrationSettingsRegistry>,
    exchanger: Arc<dyn TokenExchanger>,
    redirect_sessions: InMemoryRepository<RedirectSession, String>,
    init_sessions: InMemoryRepository<ConnectionInitSession, String>,
}

impl OAuthService {
    pub fn new(
        registry: Arc<dyn IntegrationSettingsRegistry>,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        Self {
            registry,
            exchanger,
            redirect_sessions: InMemoryRepository::new(|r: &RedirectSession| r.code.clone()),
            init_sessions: InMemoryRepository::new(|s: &ConnectionInitSession| s.session_key.clone()),
        }
    }

    /// Returns the proxy URL `/source-connections/authorize/{code}` the
    /// caller should redirect the browser to.
    pub async fn init_oauth2(
        &self,
        short_name: &str,
        organization_id: Uuid,
        payload: serde_json::Value,
        overrides: Overrides,
        now: DateTime<Utc>,
    ) -> Result<String, OAuthError> {
        let settings = self
            .registry
            .lookup(short_name)
            .ok_or_else(|| OAuthError::NotConfigured(short_name.to_string()))?;

        let state = generate_state();
        let pkce = settings.requires_pkce.then(generate_pkce);

        let mut auth_url = url::Url::parse(&settings.authorize_url)
            .map_err(|e| OAuthError::NotConfigured(e.to_string()))?;
        {
            let mut qp = auth_url.query_pairs_mut();
            qp.append_pair("client_id", overrides.client_id.as_deref().unwrap_or(&settings.client_id));
            qp.append_pair("redirect_uri", CALLBACK_PATH);
            qp.append_pair("state", &state);
            qp.append_pair("scope", &settings.scopes.join(" "));
            if let Some(pkce) = &pkce {
                qp.append_pair("code_challenge", &pkce.challenge);
                qp.append_pair("code_challenge_method", "S256");
            }
        }

        let code = generate_redirect_code();
        let redirect_session = RedirectSession::new(code.clone(), auth_url.to_string(), now);
        self.redirect_sessions
            .save(redirect_session)
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let init_session = ConnectionInitSession::new(
            state,
            short_name,
            organization_id,
            payload,
            overrides,
            code.clone(),
            pkce.map(|p| p.verifier),
            now,
        );
        self.init_sessions
            .save(init_session)
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(format!("/source-connections/authorize/{code}"))
    }

    /// OAuth1 mirrors `init_oauth2` but first fetches a request token and
    /// keys the session by `oauth_token` instead of a generated `state`.
    pub async fn init_oauth1(
        &self,
        short_name: &str,
        organization_id: Uuid,
        payload: serde_json::Value,
        mut overrides: Overrides,
        now: DateTime<Utc>,
    ) -> Result<String, OAuthError> {
        let settings = self
            .registry
            .lookup(short_name)
            .ok_or_else(|| OAuthError::NotConfigured(short_name.to_string()))?;

        let (oauth_token, oauth_token_secret) = self
            .exchanger
            .request_oauth1_token(
                &settings,
                overrides.consumer_key.as_deref(),
                overrides.consumer_secret.as_deref(),
            )
            .await?;
        overrides.oauth_token_secret = Some(oauth_token_secret);

        let authorize_url = format!("{}?oauth_token={}", settings.authorize_url, oauth_token);
        let code = generate_redirect_code();
        self.redirect_sessions
            .save(RedirectSession::new(code.clone(), authorize_url, now))
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        let init_session = ConnectionInitSession::new(
            oauth_token,
            short_name,
            organization_id,
            payload,
            overrides,
            code.clone(),
            None,
            now,
        );
        self.init_sessions
            .save(init_session)
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;

        Ok(format!("/source-connections/authorize/{code}"))
    }

    pub async fn redirect_target(&self, code: &str, now: DateTime<Utc>) -> Result<String, OAuthError> {
        let session = self
            .redirect_sessions
            .find_by_id(&code.to_string())
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?
            .ok_or(OAuthError::SessionNotFound)?;
        if session.is_expired(now) {
            return Err(OAuthError::SessionExpired);
        }
        Ok(session.provider_url)
    }

    /// Exchanges the callback artifacts for a provider token and marks the
    /// init session completed (single-use).
    pub async fn callback_oauth2(
        &self,
        state: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OAuthCompletionResult, OAuthError> {
        let mut session = self.take_pending_session(state, now).await?;
        let settings = self
            .registry
            .lookup(&session.short_name)
            .ok_or_else(|| OAuthError::NotConfigured(session.short_name.clone()))?;

        let token_response = self
            .exchanger
            .exchange_oauth2(
                &settings,
                code,
                session.code_verifier.as_deref(),
                session.overrides.client_id.as_deref(),
                session.overrides.client_secret.as_deref(),
            )
            .await?;

        self.complete_session(&mut session).await?;
        Ok(self.finish(session, token_response))
    }

    pub async fn callback_oauth1(
        &self,
        oauth_token: &str,
        verifier: &str,
        now: DateTime<Utc>,
    ) -> Result<OAuthCompletionResult, OAuthError> {
        let mut session = self.take_pending_session(oauth_token, now).await?;
        let settings = self
            .registry
            .lookup(&session.short_name)
            .ok_or_else(|| OAuthError::NotConfigured(session.short_name.clone()))?;

        let oauth_token_secret = session
            .overrides
            .oauth_token_secret
            .clone()
            .ok_or_else(|| OAuthError::TokenExchangeFailed("missing oauth_token_secret".into()))?;

        let token_response = self
            .exchanger
            .exchange_oauth1(
                &settings,
                oauth_token,
                &oauth_token_secret,
                verifier,
                session.overrides.consumer_key.as_deref(),
                session.overrides.consumer_secret.as_deref(),
            )
            .await?;

        self.complete_session(&mut session).await?;
        Ok(self.finish(session, token_response))
    }

    async fn take_pending_session(
        &self,
        session_key: &str,
        now: DateTime<Utc>,
    ) -> Result<ConnectionInitSession, OAuthError> {
        let session = self
            .init_sessions
            .find_by_id(&session_key.to_string())
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?
            .ok_or(OAuthError::SessionNotFound)?;

        if session.status != ConnectionInitSessionStatus::Pending {
            return Err(OAuthError::SessionAlreadyCompleted);
        }
        if session.is_expired(now) {
            return Err(OAuthError::SessionExpired);
        }
        Ok(session)
    }

    async fn complete_session(&self, session: &mut ConnectionInitSession) -> Result<(), OAuthError> {
        session.status = ConnectionInitSessionStatus::Completed;
        session.overrides.zeroize();
        self.init_sessions
            .save(session.clone())
            .await
            .map_err(|e| OAuthError::TokenExchangeFailed(e.to_string()))?;
        Ok(())
    }

    fn finish(&self, session: ConnectionInitSession, token_response: TokenResponse) -> OAuthCompletionResult {
        OAuthCompletionResult {
            token_response,
            original_payload: session.payload.clone(),
            overrides: session.overrides.clone(),
            short_name: session.short_name.clone(),
            organization_id: session.organization_id,
            init_session: session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::IntegrationSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRegistry;
    impl IntegrationSettingsRegistry for FakeRegistry {
        fn lookup(&self, short_name: &str) -> Option<IntegrationSettings> {
            if short_name != "slack" {
                return None;
            }
            Some(IntegrationSettings {
                short_name: "slack".into(),
                authorize_url: "https://slack.com/oauth/authorize".into(),
                token_url: "https://slack.com/oauth/token".into(),
                client_id: "builtin-id".into(),
                client_secret: "builtin-secret".into(),
                scopes: vec!["channels:read".into()],
                supports_refresh: true,
                requires_pkce: true,
                request_token_url: None,
            })
        }
    }

    struct FakeExchanger {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenExchanger for FakeExchanger {
        async fn exchange_oauth2(
            &self,
            _settings: &IntegrationSettings,
            code: &str,
            code_verifier: Option<&str>,
            _client_id_override: Option<&str>,
            _client_secret_override: Option<&str>,
        ) -> Result<TokenResponse, OAuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(code_verifier.is_some(), "pkce verifier should be forwarded");
            Ok(TokenResponse {
                access_token: format!("token-for-{code}"),
                refresh_token: None,
                expires_in: Some(3600),
                token_type: "bearer".into(),
            })
        }

        async fn exchange_oauth1(
            &self,
            _settings: &IntegrationSettings,
            oauth_token: &str,
            oauth_token_secret: &str,
            verifier: &str,
            _consumer_key_override: Option<&str>,
            _consumer_secret_override: Option<&str>,
        ) -> Result<TokenResponse, OAuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(oauth_token_secret, "request-token-secret");
            Ok(TokenResponse {
                access_token: format!("oauth1-token-for-{oauth_token}-{verifier}"),
                refresh_token: None,
                expires_in: None,
                token_type: "bearer".into(),
            })
        }

        async fn request_oauth1_token(
            &self,
            _settings: &IntegrationSettings,
            _consumer_key_override: Option<&str>,
            _consumer_secret_override: Option<&str>,
        ) -> Result<(String, String), OAuthError> {
            Ok(("request-token-abc".into(), "request-token-secret".into()))
        }
    }

    fn service() -> OAuthService {
        OAuthService::new(
            Arc::new(FakeRegistry),
            Arc::new(FakeExchanger { calls: AtomicUsize::new(0) }),
        )
    }

    #[tokio::test]
    async fn unknown_integration_is_not_configured() {
        let svc = service();
        let err = svc
            .init_oauth2("unknown", Uuid::new_v4(), serde_json::json!({}), Overrides::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn full_round_trip_completes_and_is_single_use() {
        let svc = service();
        let now = Utc::now();
        let proxy_url = svc
            .init_oauth2("slack", Uuid::new_v4(), serde_json::json!({"x": 1}), Overrides::default(), now)
            .await
            .unwrap();
        assert!(proxy_url.starts_with("/source-connections/authorize/"));
        let code = proxy_url.rsplit('/').next().unwrap();

        let target = svc.redirect_target(code, now).await.unwrap();
        assert!(target.starts_with("https://slack.com/oauth/authorize"));

        // Find the state embedded in the provider URL we just built.
        let state = url::Url::parse(&target)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .unwrap()
            .1
            .into_owned();

        let result = svc.callback_oauth2(&state, "auth-code-abc", now).await.unwrap();
        assert_eq!(result.token_response.access_token, "token-for-auth-code-abc");
        assert_eq!(result.original_payload, serde_json::json!({"x": 1}));

        // Second callback with the same state must fail: single-use.
        let err = svc.callback_oauth2(&state, "auth-code-abc", now).await.unwrap_err();
        assert!(matches!(err, OAuthError::SessionAlreadyCompleted));
    }

    #[tokio::test]
    async fn unknown_session_key_is_not_found() {
        let svc = service();
        let err = svc
            .callback_oauth2("nonexistent-state", "code", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::SessionNotFound));
    }

    #[tokio::test]
    async fn overrides_are_zeroized_after_completion() {
        let svc = service();
        let now = Utc::now();
        let overrides = Overrides {
            client_id: Some("byoc-id".into()),
            client_secret: Some("byoc-secret".into()),
            consumer_key: None,
            consumer_secret: None,
            oauth_token_secret: None,
        };
        let proxy_url = svc
            .init_oauth2("slack", Uuid::new_v4(), serde_json::json!({}), overrides, now)
            .await
            .unwrap();
        let code = proxy_url.rsplit('/').next().unwrap();
        let target = svc.redirect_target(code, now).await.unwrap();
        let state = url::Url::parse(&target)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .unwrap()
            .1
            .into_owned();

        let result = svc.callback_oauth2(&state, "abc", now).await.unwrap();
        assert!(result.init_session.overrides.is_empty());
    }

    #[tokio::test]
    async fn oauth1_round_trip_keys_session_by_oauth_token() {
        let svc = service();
        let now = Utc::now();
        let proxy_url = svc
            .init_oauth1("slack", Uuid::new_v4(), serde_json::json!({"y": 2}), Overrides::default(), now)
            .await
            .unwrap();
        let code = proxy_url.rsplit('/').next().unwrap();

        let target = svc.redirect_target(code, now).await.unwrap();
        assert!(target.contains("oauth_token=request-token-abc"));

        let result = svc.callback_oauth1("request-token-abc", "verifier-xyz", now).await.unwrap();
        assert_eq!(result.token_response.access_token, "oauth1-token-for-request-token-abc-verifier-xyz");
        assert_eq!(result.original_payload, serde_json::json!({"y": 2}));

        let err = svc.callback_oauth1("request-token-abc", "verifier-xyz", now).await.unwrap_err();
        assert!(matches!(err, OAuthError::SessionAlreadyCompleted));
    }

    #[tokio::test]
    async fn unknown_integration_rejects_oauth1_init() {
        let svc = service();
        let err = svc
            .init_oauth1("unknown", Uuid::new_v4(), serde_json::json!({}), Overrides::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, OAuthError::NotConfigured(_)));
    }
}
