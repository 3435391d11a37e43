#[derive(Debug)]
pub enum OAuthError {
    NotConfigured(String),
    SessionNotFound,
    SessionAlreadyCompleted,
    SessionExpired,
    TokenExchangeFailed(String),
}

impl std::fmt::Display for OAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OAuthError::NotConfigured(name) => write!(f, "integration `{name}` is not configured for oauth"),
            OAuthError::SessionNotFound => write!(f, "oauth session not found"),
            OAuthError::SessionAlreadyCompleted => write!(f, "oauth session already completed"),
            OAuthError::SessionExpired => write!(f, "oauth session expired"),
            OAuthError::TokenExchangeFailed(msg) => write!(f, "token exchange failed: {msg}"),
        }
    }
}

impl std::error::Error for OAuthError {}
