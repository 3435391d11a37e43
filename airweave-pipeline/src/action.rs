//! Per-entity action resolution: exactly one of INSERT/UPDATE/KEEP/DELETE
//! for every item in a batch.

use airweave_source::SourceEntity;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityAction {
    Insert,
    Update,
    Keep,
    Delete,
}

/// What the pipeline already knows about an entity_id from a prior sync.
#[derive(Debug, Clone)]
pub struct ExistingRecord {
    pub hash: String,
}

/// One resolved item of a batch, still carrying the source entity so the
/// content processor can act on INSERT/UPDATE without a second lookup.
#[derive(Debug, Clone)]
pub struct ResolvedEntity {
    pub entity_id: String,
    pub action: EntityAction,
    pub entity: SourceEntity,
    /// Set when this INSERT/UPDATE duplicates content another sync in the
    /// same collection already wrote — the metadata row is still created,
    /// but destination handlers must not receive it.
    pub skip_content_handlers: bool,
}

fn resolve_one(existing: Option<&ExistingRecord>, entity: &SourceEntity, new_hash: &str) -> EntityAction {
    match (existing, entity) {
        (None, SourceEntity::Regular(_)) => EntityAction::Insert,
        (Some(record), SourceEntity::Regular(_)) if record.hash == new_hash => EntityAction::Keep,
        (Some(_), SourceEntity::Regular(_)) => EntityAction::Update,
        (Some(_), SourceEntity::Deletion(_)) => EntityAction::Delete,
        // Deleting something never seen is an idempotent no-op, still
        // reported as DELETE so callers account for it uniformly.
        (None, SourceEntity::Deletion(_)) => EntityAction::Delete,
    }
}

/// Resolves one action per entity in a batch. `existing_lookup` must
/// reflect the DB snapshot taken at batch start — callers are expected to
/// have already deduplicated `(entity_id, entity_definition_id)` within
/// the batch, later entity wins, before calling this.
pub fn resolve_batch(
    existing_lookup: &HashMap<String, ExistingRecord>,
    entities: Vec<(SourceEntity, String)>,
) -> Vec<ResolvedEntity> {
    let mut last_by_id: HashMap<String, (SourceEntity, String)> = HashMap::new();
    for (entity, hash) in entities {
        last_by_id.insert(entity.entity_id().to_string(), (entity, hash));
    }

    last_by_id
        .into_values()
        .map(|(mut entity, hash)| {
            let entity_id = entity.entity_id().to_string();
            let existing = existing_lookup.get(&entity_id);
            let action = resolve_one(existing, &entity, &hash);
            if let SourceEntity::Regular(e) = &mut entity {
                e.airweave_system_metadata.hash = Some(hash);
            }
            ResolvedEntity {
                entity_id,
                action,
                entity,
                skip_content_handlers: false,
            }
        })
        .collect()
}

/// Applies collection-level dedup: if another sync in the same collection
/// already owns this `(entity_id, hash)` pair, the INSERT still produces a
/// metadata ownership row but is hidden from destination handlers.
pub fn apply_collection_dedup(
    resolved: &mut [ResolvedEntity],
    collection_has_hash: impl Fn(&str, &str) -> bool,
) {
    for item in resolved.iter_mut() {
        if item.action == EntityAction::Insert {
            if let SourceEntity::Regular(e) = &item.entity {
                let hash = e.airweave_system_metadata.hash.as_deref().unwrap_or_default();
                if collection_has_hash(&item.entity_id, hash) {
                    item.skip_content_handlers = true;
                }
            }
        }
    }
}
