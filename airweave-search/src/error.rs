#[derive(Debug)]
pub enum SearchError {
    Planner(String),
    Embedding(String),
    CollectionNotFound,
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Planner(msg) => write!(f, "planner error: {msg}"),
            SearchError::Embedding(msg) => write!(f, "embedding error: {msg}"),
            SearchError::CollectionNotFound => write!(f, "collection not found"),
        }
    }
}

impl std::error::Error for SearchError {}
