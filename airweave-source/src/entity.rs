//! In-memory entity types a `Source` yields, before the pipeline chunks and
//! embeds them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One hop of an entity's lineage back to its source (e.g. folder → file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub entity_id: String,
    pub name: String,
    pub entity_type: String,
}

/// Pipeline-owned fields, absent from what the source itself produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetadata {
    pub hash: Option<String>,
    pub chunk_index: Option<u32>,
    pub original_entity_id: Option<String>,
    pub dense_embedding: Option<Vec<f32>>,
    pub sparse_embedding: Option<SparseEmbedding>,
    pub local_path: Option<String>,
    pub sync_id: Option<uuid::Uuid>,
    pub should_skip: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseEmbedding {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

/// Declares how one field on `BaseEntity::fields` participates in the
/// pipeline. Replaces the runtime-reflection field annotations a dynamic
/// language would use with a static descriptor table per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub is_entity_id: bool,
    pub is_name: bool,
    pub is_created_at: bool,
    pub is_updated_at: bool,
    pub embeddable: bool,
}

impl FieldSpec {
    pub const fn plain(name: &'static str, embeddable: bool) -> Self {
        Self {
            name,
            is_entity_id: false,
            is_name: false,
            is_created_at: false,
            is_updated_at: false,
            embeddable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseEntity {
    pub entity_id: String,
    /// The connector-declared entity definition name, e.g. `asana_task`.
    /// Drives the per-type absolute counts on the entity-counts topic.
    pub entity_type: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub name: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Arbitrary connector-declared payload, keyed by field name.
    pub fields: Map<String, Value>,
    pub airweave_system_metadata: SystemMetadata,
}

impl BaseEntity {
    pub fn new(entity_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type: "unknown".to_string(),
            breadcrumbs: Vec::new(),
            name: name.into(),
            created_at: None,
            updated_at: None,
            fields: Map::new(),
            airweave_system_metadata: SystemMetadata::default(),
        }
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = entity_type.into();
        self
    }

    /// The JSON payload hashed for change detection, excluding
    /// `airweave_system_metadata` itself.
    pub fn hashable_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("entity_id".into(), Value::String(self.entity_id.clone()));
        map.insert("name".into(), Value::String(self.name.clone()));
        if let Some(ts) = self.created_at {
            map.insert("created_at".into(), Value::String(ts.to_rfc3339()));
        }
        if let Some(ts) = self.updated_at {
            map.insert("updated_at".into(), Value::String(ts.to_rfc3339()));
        }
        for (k, v) in &self.fields {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

/// A file-backed entity: local bytes are downloaded on demand before
/// content processing can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntity {
    pub base: BaseEntity,
    pub url: String,
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    pub local_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeFileEntity {
    pub base: FileEntity,
    pub language: Option<String>,
}

/// An entity whose field set is determined per source table/collection
/// rather than known statically (generic DB connectors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolymorphicEntity {
    pub base: BaseEntity,
    pub schema_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionStatus {
    Deleted,
    PermissionRevoked,
}

/// A tombstone: the source reports this entity_id no longer exists (or is
/// no longer visible), carrying nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionEntity {
    pub entity_id: String,
    pub deletion_status: DeletionStatus,
}

/// What `EntityPipeline::process` actually receives per item — a regular
/// entity or a tombstone, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceEntity {
    Regular(BaseEntity),
    Deletion(DeletionEntity),
}

impl SourceEntity {
    pub fn entity_id(&self) -> &str {
        match self {
            SourceEntity::Regular(e) => &e.entity_id,
            SourceEntity::Deletion(d) => &d.entity_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashable_value_excludes_system_metadata() {
        let mut entity = BaseEntity::new("e1", "Doc One");
        entity.fields.insert("body".into(), Value::String("hello".into()));
        entity.airweave_system_metadata.hash = Some("should-not-appear".into());

        let value = entity.hashable_value();
        assert!(value.get("hash").is_none());
        assert_eq!(value.get("body").unwrap(), "hello");
    }

    #[test]
    fn source_entity_entity_id_works_for_both_variants() {
        let regular = SourceEntity::Regular(BaseEntity::new("e1", "a"));
        let deletion = SourceEntity::Deletion(DeletionEntity {
            entity_id: "e2".into(),
            deletion_status: DeletionStatus::Deleted,
        });
        assert_eq!(regular.entity_id(), "e1");
        assert_eq!(deletion.entity_id(), "e2");
    }
}
