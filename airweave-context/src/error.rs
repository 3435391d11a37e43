#[derive(Debug)]
pub enum ContextError {
    NoValidAuthentication,
    InvalidApiKey,
    OrganizationContextRequired,
    OrganizationNotFound,
    OrganizationAccessDenied,
    RateLimited { retry_after_secs: u64 },
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::NoValidAuthentication => write!(f, "no valid authentication"),
            ContextError::InvalidApiKey => write!(f, "api key expired or invalid"),
            ContextError::OrganizationContextRequired => write!(f, "organization context required"),
            ContextError::OrganizationNotFound => write!(f, "organization not found"),
            ContextError::OrganizationAccessDenied => write!(f, "organization access denied"),
            ContextError::RateLimited { retry_after_secs } => {
                write!(f, "rate limited, retry after {retry_after_secs}s")
            }
        }
    }
}

impl std::error::Error for ContextError {}

impl From<ContextError> for airweave_core::AppError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::NoValidAuthentication => airweave_core::AppError::Auth(err.to_string()),
            ContextError::InvalidApiKey => airweave_core::AppError::Auth(err.to_string()),
            ContextError::OrganizationContextRequired => airweave_core::AppError::Validation(err.to_string()),
            ContextError::OrganizationNotFound => airweave_core::AppError::NotFound(err.to_string()),
            ContextError::OrganizationAccessDenied => airweave_core::AppError::Auth(err.to_string()),
            ContextError::RateLimited { retry_after_secs } => {
                airweave_core::AppError::RateLimit(err.to_string(), retry_after_secs)
            }
        }
    }
}
