#[derive(Debug)]
pub enum SyncFailureError {
    EmbeddingConfigChanged { stamped: String, actual: String },
    DestinationDispatch(String),
    ContentProcessing(String),
    ContractBreach(String),
}

impl std::fmt::Display for SyncFailureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncFailureError::EmbeddingConfigChanged { stamped, actual } => write!(
                f,
                "embedding config changed mid-sync: collection stamped {stamped}, batch produced {actual}"
            ),
            SyncFailureError::DestinationDispatch(msg) => write!(f, "destination dispatch failed: {msg}"),
            SyncFailureError::ContentProcessing(msg) => write!(f, "content processing failed: {msg}"),
            SyncFailureError::ContractBreach(msg) => write!(f, "pipeline contract violation: {msg}"),
        }
    }
}

impl std::error::Error for SyncFailureError {}

/// Transient provider errors retry under the circuit breaker; everything
/// else is fatal and surfaces as [`SyncFailureError`] immediately.
#[derive(Debug)]
pub enum ProviderError {
    RateLimited,
    ServerError(u16),
    Timeout,
    Connection(String),
    NonRetryable(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::RateLimited => write!(f, "rate limited (429)"),
            ProviderError::ServerError(code) => write!(f, "server error ({code})"),
            ProviderError::Timeout => write!(f, "timeout"),
            ProviderError::Connection(msg) => write!(f, "connection error: {msg}"),
            ProviderError::NonRetryable(msg) => write!(f, "non-retryable: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProviderError::NonRetryable(_))
    }
}
