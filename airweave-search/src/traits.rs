use crate::error::SearchError;
use crate::model::{
    CollectionMetadata, EvaluateOutput, HistoryItem, PlanOutput, ResultBrief, RetrievalStrategy, SearchHit, SearchMode,
};
use airweave_core::types::CollectionId;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait CollectionMetadataProvider: Send + Sync {
    async fn describe(&self, collection_id: CollectionId) -> Result<CollectionMetadata, SearchError>;
}

#[async_trait]
pub trait LlmPlanner: Send + Sync {
    async fn plan(
        &self,
        query: &str,
        mode: SearchMode,
        metadata: &CollectionMetadata,
        history: &[HistoryItem],
    ) -> Result<PlanOutput, SearchError>;

    async fn evaluate(&self, brief: &ResultBrief, history: &[HistoryItem]) -> Result<EvaluateOutput, SearchError>;

    async fn compose(&self, history: &[HistoryItem], limit: usize) -> Result<String, SearchError>;
}

#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    async fn embed_query(&self, query: &str, strategy: RetrievalStrategy) -> Result<Vec<f32>, SearchError>;
}

/// Executed against whatever vector DB destination backs the collection.
/// Provider errors are caught by the caller and folded into an empty
/// brief plus a recorded error for the evaluator, never propagated raw.
#[async_trait]
pub trait VectorQueryExecutor: Send + Sync {
    async fn query(
        &self,
        collection_id: CollectionId,
        embedded_query: &[f32],
        combined_filters: Option<&Value>,
        limit: usize,
    ) -> Result<Vec<SearchHit>, String>;
}
