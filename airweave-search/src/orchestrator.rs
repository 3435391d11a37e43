//! Plan -> embed -> query -> evaluate -> compose loop, with a hard
//! consolidation pass and a bounded history window.

use crate::error::SearchError;
use crate::model::{HistoryItem, ResultBrief, SearchHit, SearchOutcome, SearchRequest};
use crate::traits::{CollectionMetadataProvider, LlmPlanner, QueryEmbedder, VectorQueryExecutor};
use airweave_events::{topics, EventBus};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;

/// Drops the oldest iteration once history exceeds this count, to bound
/// prompt growth on long agentic searches.
pub const MAX_HISTORY_ITERATIONS: usize = 10;
const SAMPLE_SIZE: usize = 5;

pub struct SearchOrchestrator {
    metadata: Arc<dyn CollectionMetadataProvider>,
    planner: Arc<dyn LlmPlanner>,
    embedder: Arc<dyn QueryEmbedder>,
    executor: Arc<dyn VectorQueryExecutor>,
    bus: EventBus,
}

impl SearchOrchestrator {
    pub fn new(
        metadata: Arc<dyn CollectionMetadataProvider>,
        planner: Arc<dyn LlmPlanner>,
        embedder: Arc<dyn QueryEmbedder>,
        executor: Arc<dyn VectorQueryExecutor>,
        bus: EventBus,
    ) -> Self {
        Self { metadata, planner, embedder, executor, bus }
    }

    pub async fn run(&self, request: SearchRequest) -> Result<SearchOutcome, SearchError> {
        let collection_metadata = self.metadata.describe(request.collection_id).await?;
        let mut history: VecDeque<HistoryItem> = VecDeque::new();
        let mut last_hits: Vec<SearchHit> = Vec::new();
        let mut iteration: u32 = 1;
        let mut consolidated = false;

        loop {
            self.emit("planning", iteration).await;
            let plan = self.planner.plan(&request.query, request.mode, &collection_metadata, history.make_contiguous()).await?;

            self.emit("searching", iteration).await;
            let combined_filters = combine_filters(plan.llm_filters.clone(), request.user_filter.clone());
            let embedded = self
                .embedder
                .embed_query(&plan.query, plan.retrieval_strategy)
                .await
                .map_err(|e| SearchError::Embedding(e.to_string()))?;

            let (hits, brief) = match self
                .executor
                .query(request.collection_id, &embedded, combined_filters.as_ref(), request.limit)
                .await
            {
                Ok(hits) => {
                    let brief = ResultBrief::from_hits(&hits, SAMPLE_SIZE);
                    (hits, brief)
                }
                Err(provider_error) => {
                    self.emit("error", iteration).await;
                    (Vec::new(), ResultBrief::from_provider_error(provider_error))
                }
            };
            last_hits = hits;

            self.emit("evaluating", iteration).await;
            let evaluation = self.planner.evaluate(&brief, history.make_contiguous()).await?;
            let should_continue = evaluation.should_continue;
            let answer_found = evaluation.answer_found;

            push_bounded(&mut history, HistoryItem { iteration, plan, brief, evaluation });

            if answer_found {
                break;
            }
            if should_continue {
                iteration += 1;
                continue;
            }

            // Not continuing but no answer: one last consolidation pass.
            consolidated = true;
            iteration += 1;
            self.emit("planning", iteration).await;
            let plan = self
                .planner
                .plan(&request.query, request.mode, &collection_metadata, history.make_contiguous())
                .await?;
            self.emit("searching", iteration).await;
            let combined_filters = combine_filters(plan.llm_filters.clone(), request.user_filter.clone());
            let embedded = self
                .embedder
                .embed_query(&plan.query, plan.retrieval_strategy)
                .await
                .map_err(|e| SearchError::Embedding(e.to_string()))?;
            let (hits, brief) = match self
                .executor
                .query(request.collection_id, &embedded, combined_filters.as_ref(), request.limit)
                .await
            {
                Ok(hits) => {
                    let brief = ResultBrief::from_hits(&hits, SAMPLE_SIZE);
                    (hits, brief)
                }
                Err(provider_error) => (Vec::new(), ResultBrief::from_provider_error(provider_error)),
            };
            last_hits = hits;
            self.emit("evaluating", iteration).await;
            let evaluation = self.planner.evaluate(&brief, history.make_contiguous()).await?;
            push_bounded(&mut history, HistoryItem { iteration, plan, brief, evaluation });
            break;
        }

        let answer = self.planner.compose(history.make_contiguous(), request.limit).await?;
        last_hits.truncate(request.limit);
        self.emit("done", iteration).await;

        Ok(SearchOutcome { answer, hits: last_hits, iterations_run: iteration, consolidated })
    }

    async fn emit(&self, phase: &str, iteration: u32) {
        self.bus
            .emit(topics::SEARCH_PROGRESS, json!({ "phase": phase, "iteration": iteration }))
            .await;
    }
}

fn push_bounded(history: &mut VecDeque<HistoryItem>, item: HistoryItem) {
    history.push_back(item);
    while history.len() > MAX_HISTORY_ITERATIONS {
        history.pop_front();
    }
}

fn combine_filters(llm_filters: Option<serde_json::Value>, user_filter: Option<serde_json::Value>) -> Option<serde_json::Value> {
    match (llm_filters, user_filter) {
        (Some(a), Some(b)) => Some(json!({ "and": [a, b] })),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CollectionMetadata, EvaluateOutput, PlanOutput, RetrievalStrategy, SearchMode};
    use airweave_core::types::CollectionId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeMetadata;
    #[async_trait]
    impl CollectionMetadataProvider for FakeMetadata {
        async fn describe(&self, _collection_id: CollectionId) -> Result<CollectionMetadata, SearchError> {
            Ok(CollectionMetadata { source_names: vec!["slack".into()], entity_schema_summary: "msg".into(), counts_by_source: vec![] })
        }
    }

    struct FakePlanner {
        continues: u32,
        calls: AtomicU32,
    }
    #[async_trait]
    impl LlmPlanner for FakePlanner {
        async fn plan(&self, query: &str, _mode: SearchMode, _metadata: &CollectionMetadata, _history: &[HistoryItem]) -> Result<PlanOutput, SearchError> {
            Ok(PlanOutput { query: query.to_string(), retrieval_strategy: RetrievalStrategy::Hybrid, llm_filters: None })
        }
        async fn evaluate(&self, _brief: &ResultBrief, _history: &[HistoryItem]) -> Result<EvaluateOutput, SearchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EvaluateOutput { should_continue: n + 1 < self.continues, answer_found: n + 1 >= self.continues })
        }
        async fn compose(&self, _history: &[HistoryItem], _limit: usize) -> Result<String, SearchError> {
            Ok("final answer".to_string())
        }
    }

    struct FakeEmbedder;
    #[async_trait]
    impl QueryEmbedder for FakeEmbedder {
        async fn embed_query(&self, _query: &str, _strategy: RetrievalStrategy) -> Result<Vec<f32>, SearchError> {
            Ok(vec![0.1, 0.2])
        }
    }

    struct FakeExecutor {
        fail: bool,
    }
    #[async_trait]
    impl VectorQueryExecutor for FakeExecutor {
        async fn query(&self, _collection_id: CollectionId, _embedded_query: &[f32], _filters: Option<&serde_json::Value>, _limit: usize) -> Result<Vec<SearchHit>, String> {
            if self.fail {
                Err("vector db down".to_string())
            } else {
                Ok(vec![SearchHit { chunk_entity_id: "c1".into(), score: 0.9, payload: json!({}) }])
            }
        }
    }

    fn request() -> SearchRequest {
        SearchRequest {
            collection_id: CollectionId::new(),
            query: "find the onboarding doc".into(),
            mode: SearchMode::Agentic,
            user_filter: None,
            limit: 10,
        }
    }

    #[tokio::test]
    async fn stops_as_soon_as_answer_found() {
        let orchestrator = SearchOrchestrator::new(
            Arc::new(FakeMetadata),
            Arc::new(FakePlanner { continues: 2, calls: AtomicU32::new(0) }),
            Arc::new(FakeEmbedder),
            Arc::new(FakeExecutor { fail: false }),
            EventBus::unbounded(),
        );
        let outcome = orchestrator.run(request()).await.unwrap();
        assert_eq!(outcome.answer, "final answer");
        assert!(!outcome.hits.is_empty());
        assert!(!outcome.consolidated);
    }

    #[tokio::test]
    async fn provider_error_is_swallowed_into_empty_brief() {
        let orchestrator = SearchOrchestrator::new(
            Arc::new(FakeMetadata),
            Arc::new(FakePlanner { continues: 1, calls: AtomicU32::new(0) }),
            Arc::new(FakeEmbedder),
            Arc::new(FakeExecutor { fail: true }),
            EventBus::unbounded(),
        );
        let outcome = orchestrator.run(request()).await.unwrap();
        assert!(outcome.hits.is_empty());
    }

    #[test]
    fn history_window_never_exceeds_bound() {
        let mut history = VecDeque::new();
        for i in 0..(MAX_HISTORY_ITERATIONS as u32 + 5) {
            push_bounded(
                &mut history,
                HistoryItem {
                    iteration: i,
                    plan: PlanOutput { query: "q".into(), retrieval_strategy: RetrievalStrategy::Dense, llm_filters: None },
                    brief: ResultBrief::from_hits(&[], 5),
                    evaluation: EvaluateOutput { should_continue: true, answer_found: false },
                },
            );
        }
        assert_eq!(history.len(), MAX_HISTORY_ITERATIONS);
        assert_eq!(history.front().unwrap().iteration, 5);
    }
}
