//! Error taxonomy for repository operations.

use airweave_core::AppError;

#[derive(Debug)]
pub enum DataError {
    NotFound(String),
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "not found: {msg}"),
            DataError::Database(err) => write!(f, "database error: {err}"),
            DataError::Other(msg) => write!(f, "data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => AppError::NotFound(msg),
            DataError::Database(e) => AppError::RemoteProvider(e.to_string()),
            DataError::Other(msg) => AppError::Invariant(msg),
        }
    }
}
