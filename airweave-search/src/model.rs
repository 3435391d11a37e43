use airweave_core::types::CollectionId;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Fast,
    Agentic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
    Dense,
    Sparse,
    Hybrid,
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub collection_id: CollectionId,
    pub query: String,
    pub mode: SearchMode,
    pub user_filter: Option<Value>,
    pub limit: usize,
}

/// Per-definition source metadata fed to the planner/composer as LLM
/// context — source names, entity schemas, counts.
#[derive(Debug, Clone)]
pub struct CollectionMetadata {
    pub source_names: Vec<String>,
    pub entity_schema_summary: String,
    pub counts_by_source: Vec<(String, u64)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    pub query: String,
    pub retrieval_strategy: RetrievalStrategy,
    pub llm_filters: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk_entity_id: String,
    pub score: f32,
    pub payload: Value,
}

/// Deterministic summary built from raw hits, handed to the evaluator —
/// never the raw hits themselves, so evaluation is reproducible.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBrief {
    pub hit_count: usize,
    pub top_scores: Vec<f32>,
    pub sample_payloads: Vec<Value>,
    pub provider_error: Option<String>,
}

impl ResultBrief {
    pub fn from_hits(hits: &[SearchHit], sample_size: usize) -> Self {
        Self {
            hit_count: hits.len(),
            top_scores: hits.iter().take(sample_size).map(|h| h.score).collect(),
            sample_payloads: hits.iter().take(sample_size).map(|h| h.payload.clone()).collect(),
            provider_error: None,
        }
    }

    pub fn from_provider_error(message: String) -> Self {
        Self {
            hit_count: 0,
            top_scores: Vec::new(),
            sample_payloads: Vec::new(),
            provider_error: Some(message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluateOutput {
    pub should_continue: bool,
    pub answer_found: bool,
}

#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub iteration: u32,
    pub plan: PlanOutput,
    pub brief: ResultBrief,
    pub evaluation: EvaluateOutput,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub answer: String,
    pub hits: Vec<SearchHit>,
    pub iterations_run: u32,
    pub consolidated: bool,
}
