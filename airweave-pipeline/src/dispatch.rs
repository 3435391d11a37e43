//! Concurrent, all-or-nothing dispatch to destination handlers, followed
//! by the metadata handler only if every destination succeeded.

use crate::action::{EntityAction, ResolvedEntity};
use crate::error::SyncFailureError;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::HashSet;

/// One chunk entity ready to land in a destination (vector DB, keyword
/// index, ...). Dispatch operates on chunk-level identity, not parent
/// entity identity.
#[derive(Debug, Clone)]
pub struct ChunkWrite {
    pub chunk_entity_id: String,
    pub original_entity_id: String,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait DestinationHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn insert(&self, chunks: &[ChunkWrite]) -> Result<(), SyncFailureError>;

    /// Deletes every existing chunk for `original_entity_id`, then inserts
    /// the replacement set — called for UPDATE.
    async fn replace(&self, original_entity_id: &str, chunks: &[ChunkWrite]) -> Result<(), SyncFailureError>;

    async fn delete(&self, original_entity_id: &str) -> Result<(), SyncFailureError>;

    /// Deletes every entity_id this handler holds for the sync that is
    /// NOT in `seen_entity_ids`.
    async fn delete_orphans(&self, seen_entity_ids: &HashSet<String>) -> Result<(), SyncFailureError>;
}

#[async_trait]
pub trait MetadataHandler: Send + Sync {
    async fn bulk_upsert(&self, entities: &[ResolvedEntity]) -> Result<(), SyncFailureError>;
    async fn bulk_update_hash(&self, entities: &[ResolvedEntity]) -> Result<(), SyncFailureError>;
    async fn bulk_remove(&self, entity_ids: &[String]) -> Result<(), SyncFailureError>;
}

/// Builds the destination-facing chunk batch per resolved action,
/// excluding collection-deduped inserts.
fn plan_destination_writes(resolved: &[ResolvedEntity], chunks_by_entity: &std::collections::HashMap<String, Vec<ChunkWrite>>) -> Vec<DestinationOp> {
    resolved
        .iter()
        .filter(|r| !r.skip_content_handlers)
        .filter_map(|r| {
            let chunks = chunks_by_entity.get(&r.entity_id).cloned().unwrap_or_default();
            match r.action {
                EntityAction::Insert => Some(DestinationOp::Insert(r.entity_id.clone(), chunks)),
                EntityAction::Update => Some(DestinationOp::Replace(r.entity_id.clone(), chunks)),
                EntityAction::Delete => Some(DestinationOp::Delete(r.entity_id.clone())),
                EntityAction::Keep => None,
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
enum DestinationOp {
    Insert(String, Vec<ChunkWrite>),
    Replace(String, Vec<ChunkWrite>),
    Delete(String),
}

async fn apply_ops_to_handler(handler: &dyn DestinationHandler, ops: &[DestinationOp]) -> Result<(), SyncFailureError> {
    for op in ops {
        match op {
            DestinationOp::Insert(_, chunks) => handler.insert(chunks).await?,
            DestinationOp::Replace(entity_id, chunks) => handler.replace(entity_id, chunks).await?,
            DestinationOp::Delete(entity_id) => handler.delete(entity_id).await?,
        }
    }
    Ok(())
}

/// Dispatches one resolved batch: all destination handlers run
/// concurrently; only if every one succeeds does the metadata handler
/// run. A metadata row's presence must always imply successful indexing.
pub async fn dispatch_batch(
    destinations: &[std::sync::Arc<dyn DestinationHandler>],
    metadata: &dyn MetadataHandler,
    resolved: &[ResolvedEntity],
    chunks_by_entity: &std::collections::HashMap<String, Vec<ChunkWrite>>,
) -> Result<(), SyncFailureError> {
    let ops = plan_destination_writes(resolved, chunks_by_entity);

    let results = join_all(
        destinations
            .iter()
            .map(|handler| apply_ops_to_handler(handler.as_ref(), &ops)),
    )
    .await;

    let failures: Vec<String> = results
        .into_iter()
        .zip(destinations.iter())
        .filter_map(|(result, handler)| result.err().map(|e| format!("{}: {e}", handler.name())))
        .collect();

    if !failures.is_empty() {
        return Err(SyncFailureError::DestinationDispatch(failures.join("; ")));
    }

    let upserts: Vec<ResolvedEntity> = resolved
        .iter()
        .filter(|r| matches!(r.action, EntityAction::Insert | EntityAction::Update))
        .cloned()
        .collect();
    let kept: Vec<ResolvedEntity> = resolved
        .iter()
        .filter(|r| r.action == EntityAction::Keep)
        .cloned()
        .collect();
    let removed_ids: Vec<String> = resolved
        .iter()
        .filter(|r| r.action == EntityAction::Delete)
        .map(|r| r.entity_id.clone())
        .collect();

    if !upserts.is_empty() {
        metadata.bulk_upsert(&upserts).await?;
    }
    if !kept.is_empty() {
        metadata.bulk_update_hash(&kept).await?;
    }
    if !removed_ids.is_empty() {
        metadata.bulk_remove(&removed_ids).await?;
    }
    Ok(())
}

/// Runs the end-of-sync orphan pass across every destination handler
/// concurrently.
pub async fn cleanup_orphans(
    destinations: &[std::sync::Arc<dyn DestinationHandler>],
    seen_entity_ids: &HashSet<String>,
) -> Result<(), SyncFailureError> {
    let results = join_all(destinations.iter().map(|h| h.delete_orphans(seen_entity_ids))).await;
    let failures: Vec<String> = results
        .into_iter()
        .zip(destinations.iter())
        .filter_map(|(r, h)| r.err().map(|e| format!("{}: {e}", h.name())))
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(SyncFailureError::DestinationDispatch(failures.join("; ")))
    }
}
