//! Ties `Source` streaming, change detection, content processing, and
//! all-or-nothing destination dispatch into one sync run, per the data
//! flow a sync job follows end to end.

use airweave_core::types::{SourceConnectionId, SyncId, SyncJobId};
use airweave_credentials::cursor::CursorStore;
use airweave_events::EventBus;
use airweave_pipeline::action::{apply_collection_dedup, resolve_batch, EntityAction, ExistingRecord};
use airweave_pipeline::content::{build_textual_representation, chunk_semantic, embed_dense_validated, DenseEmbedder};
use airweave_pipeline::dispatch::{cleanup_orphans, dispatch_batch, ChunkWrite, DestinationHandler, MetadataHandler};
use airweave_pipeline::embedding_stamp::{EmbeddingStamp, EmbeddingStampRegistry};
use airweave_pipeline::error::SyncFailureError;
use airweave_pipeline::hash::content_hash;
use airweave_pipeline::progress::{CounterKind, SyncProgress};
use airweave_source::{FieldSpec, Source, SourceEntity};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_stream::StreamExt;

const BATCH_SIZE: usize = 64;

pub struct SyncOrchestrator {
    source: Arc<dyn Source>,
    field_specs: Vec<FieldSpec>,
    embedder: Arc<dyn DenseEmbedder>,
    destinations: Vec<Arc<dyn DestinationHandler>>,
    metadata: Arc<dyn MetadataHandler>,
    cursors: CursorStore,
    progress: Arc<SyncProgress>,
    embedding_stamps: EmbeddingStampRegistry,
    collection_id: String,
}

impl SyncOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn Source>,
        field_specs: Vec<FieldSpec>,
        embedder: Arc<dyn DenseEmbedder>,
        destinations: Vec<Arc<dyn DestinationHandler>>,
        metadata: Arc<dyn MetadataHandler>,
        cursors: CursorStore,
        bus: EventBus,
        sync_id: SyncId,
        job_id: SyncJobId,
        embedding_stamps: EmbeddingStampRegistry,
        collection_id: String,
    ) -> Self {
        Self {
            source,
            field_specs,
            embedder,
            destinations,
            metadata,
            cursors,
            progress: Arc::new(SyncProgress::new(sync_id, job_id, bus)),
            embedding_stamps,
            collection_id,
        }
    }

    /// Runs one full sync: streams entities in fixed-size batches, resolves
    /// each batch's action, builds text/chunks/embeddings, dispatches to
    /// every destination concurrently, then cleans up orphans and
    /// persists the cursor. `existing_lookup` is the DB hash snapshot
    /// taken at batch start; `collection_has_hash` implements
    /// collection-level content dedup.
    pub async fn run(
        &self,
        source_connection_id: SourceConnectionId,
        existing_lookup: &HashMap<String, ExistingRecord>,
        collection_has_hash: impl Fn(&str, &str) -> bool + Send + Sync,
    ) -> Result<(), SyncFailureError> {
        let cursor = self.cursors.get(&source_connection_id).await.map(|c| serde_json::Value::Object(c.cursor_data));
        let mut stream = self.source.generate_entities(cursor);
        let mut seen_entity_ids = HashSet::new();
        let mut pending: Vec<SourceEntity> = Vec::new();

        loop {
            let next = stream.next().await;
            match next {
                Some(Ok(entity)) => {
                    seen_entity_ids.insert(entity.entity_id().to_string());
                    pending.push(entity);
                    if pending.len() >= BATCH_SIZE {
                        self.process_batch(std::mem::take(&mut pending), existing_lookup, &collection_has_hash)
                            .await?;
                    }
                }
                Some(Err(_)) => {
                    return Err(SyncFailureError::ContentProcessing("source stream error".into()));
                }
                None => break,
            }
        }
        if !pending.is_empty() {
            self.process_batch(pending, existing_lookup, &collection_has_hash).await?;
        }

        cleanup_orphans(&self.destinations, &seen_entity_ids).await?;

        if let Some(serde_json::Value::Object(cursor_data)) = self.source.current_cursor() {
            self.cursors.set(source_connection_id, cursor_data, None).await;
        }

        self.progress.flush().await;
        Ok(())
    }

    async fn process_batch(
        &self,
        batch: Vec<SourceEntity>,
        existing_lookup: &HashMap<String, ExistingRecord>,
        collection_has_hash: &(impl Fn(&str, &str) -> bool + Send + Sync),
    ) -> Result<(), SyncFailureError> {
        let hashed: Vec<(SourceEntity, String)> = batch
            .into_iter()
            .map(|entity| {
                let hash = match &entity {
                    SourceEntity::Regular(e) => content_hash(&e.hashable_value()),
                    SourceEntity::Deletion(_) => String::new(),
                };
                (entity, hash)
            })
            .collect();

        let mut resolved = resolve_batch(existing_lookup, hashed);
        apply_collection_dedup(&mut resolved, collection_has_hash);

        let has_content_work = resolved
            .iter()
            .any(|r| !r.skip_content_handlers && matches!(r.action, EntityAction::Insert | EntityAction::Update));
        if has_content_work {
            self.embedding_stamps.check_or_stamp(
                &self.collection_id,
                EmbeddingStamp {
                    model: self.embedder.model_name().to_string(),
                    dimensions: self.embedder.vector_size(),
                },
            )?;
        }

        let mut chunks_by_entity: HashMap<String, Vec<ChunkWrite>> = HashMap::new();
        for item in &resolved {
            if item.skip_content_handlers || !matches!(item.action, EntityAction::Insert | EntityAction::Update) {
                continue;
            }
            let SourceEntity::Regular(entity) = &item.entity else {
                continue;
            };
            let text = build_textual_representation(entity, &self.field_specs);
            if text.is_empty() {
                self.progress.increment(CounterKind::Skipped, 1).await;
                continue;
            }
            let chunks = chunk_semantic(&text);
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let vectors = embed_dense_validated(self.embedder.as_ref(), &texts)
                .await
                .map_err(|e| SyncFailureError::ContentProcessing(e.to_string()))?;

            let writes: Vec<ChunkWrite> = chunks
                .iter()
                .zip(vectors)
                .enumerate()
                .map(|(i, (chunk, vector))| ChunkWrite {
                    chunk_entity_id: format!("{}__chunk_{i}", item.entity_id),
                    original_entity_id: item.entity_id.clone(),
                    payload: json!({
                        "text": chunk.text,
                        "start_index": chunk.start_index,
                        "end_index": chunk.end_index,
                        "vector": vector,
                    }),
                })
                .collect();
            chunks_by_entity.insert(item.entity_id.clone(), writes);
        }

        dispatch_batch(&self.destinations, self.metadata.as_ref(), &resolved, &chunks_by_entity).await?;

        for item in &resolved {
            let kind = match item.action {
                EntityAction::Insert => CounterKind::Inserted,
                EntityAction::Update => CounterKind::Updated,
                EntityAction::Keep => CounterKind::Kept,
                EntityAction::Delete => CounterKind::Deleted,
            };
            self.progress.increment(kind, 1).await;
            let entity_type = match &item.entity {
                SourceEntity::Regular(entity) => entity.entity_type.as_str(),
                SourceEntity::Deletion(_) => "unknown",
            };
            self.progress.record_entity_type(entity_type, kind).await;
        }
        Ok(())
    }
}
