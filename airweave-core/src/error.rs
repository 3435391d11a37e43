//! The closed error taxonomy shared across the Airweave core.
//!
//! Every subsystem crate defines its own narrow error enum and converts
//! it into `AppError` at its public boundary. Callers that only need the
//! taxonomy kind (to decide retry vs. fail) match on [`AppError::kind`]
//! rather than the variant directly.

use std::fmt;

/// Coarse error kind, independent of the message. Drives retry policy
/// and status-code mapping at any thin transport layer a caller may
/// bolt on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    NotFound,
    Conflict,
    PaymentRequired,
    UsageLimit,
    RateLimit,
    RemoteProvider,
    Invariant,
}

/// The shared application error. Messages are always sanitized — no stack
/// traces, no secret material — before being stored here, since
/// `SyncJob.error` and similar fields are surfaced to end users.
pub enum AppError {
    Validation(String),
    Auth(String),
    NotFound(String),
    Conflict(String),
    PaymentRequired(String),
    UsageLimit(String),
    RateLimit(String, u64),
    RemoteProvider(String),
    Invariant(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "validation error: {msg}"),
            AppError::Auth(msg) => write!(f, "authentication/permission error: {msg}"),
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::Conflict(msg) => write!(f, "conflict: {msg}"),
            AppError::PaymentRequired(msg) => write!(f, "payment required: {msg}"),
            AppError::UsageLimit(msg) => write!(f, "usage limit exceeded: {msg}"),
            AppError::RateLimit(msg, retry_after) => write!(f, "rate limited, retry after {retry_after}s: {msg}"),
            AppError::RemoteProvider(msg) => write!(f, "remote provider error: {msg}"),
            AppError::Invariant(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Auth(_) => ErrorKind::Auth,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::PaymentRequired(_) => ErrorKind::PaymentRequired,
            AppError::UsageLimit(_) => ErrorKind::UsageLimit,
            AppError::RateLimit(..) => ErrorKind::RateLimit,
            AppError::RemoteProvider(_) => ErrorKind::RemoteProvider,
            AppError::Invariant(_) => ErrorKind::Invariant,
        }
    }

    /// Transient kinds are the only ones the pipeline retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::RemoteProvider)
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as fmt::Display>::fmt(self, f)
    }
}

/// Generate `From<E> for AppError` implementations that map external error
/// types to a specific `AppError` variant.
#[macro_export]
macro_rules! map_error {
    ( $( $err_ty:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$err_ty> for $crate::error::AppError {
                fn from(err: $err_ty) -> Self {
                    $crate::error::AppError::$variant(err.to_string())
                }
            }
        )*
    };
}
