#[derive(Debug)]
pub enum OrgSagaError {
    IdentityProvider(String),
    Payments(String),
    LocalCommit(String),
    NotFound,
}

impl std::fmt::Display for OrgSagaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrgSagaError::IdentityProvider(msg) => write!(f, "identity provider error: {msg}"),
            OrgSagaError::Payments(msg) => write!(f, "payments provider error: {msg}"),
            OrgSagaError::LocalCommit(msg) => write!(f, "local unit of work failed: {msg}"),
            OrgSagaError::NotFound => write!(f, "organization not found"),
        }
    }
}

impl std::error::Error for OrgSagaError {}
