//! Per-source-connection sync cursors.

use airweave_core::types::SourceConnectionId;
use airweave_data::{InMemoryRepository, Repository};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncCursor {
    pub source_connection_id: SourceConnectionId,
    /// Arbitrary connector-defined cursor state, e.g. `{"page_token": "..."}`.
    pub cursor_data: Map<String, Value>,
    /// Name of the field the connector used to derive `cursor_data`, if any.
    pub cursor_field: Option<String>,
}

use serde::{Deserialize, Serialize};

/// Holds the latest cursor per source connection. Writes replace the whole
/// row — there is no partial update, so a writer never observes a mix of
/// an old `cursor_data` with a new `cursor_field`.
#[derive(Clone)]
pub struct CursorStore {
    repo: InMemoryRepository<SyncCursor, SourceConnectionId>,
}

impl CursorStore {
    pub fn new() -> Self {
        Self {
            repo: InMemoryRepository::new(|c| c.source_connection_id),
        }
    }

    pub async fn get(&self, id: &SourceConnectionId) -> Option<SyncCursor> {
        self.repo.find_by_id(id).await.ok().flatten()
    }

    pub async fn set(
        &self,
        source_connection_id: SourceConnectionId,
        cursor_data: Map<String, Value>,
        cursor_field: Option<String>,
    ) {
        let _ = self
            .repo
            .save(SyncCursor {
                source_connection_id,
                cursor_data,
                cursor_field,
            })
            .await;
    }

    pub async fn clear(&self, id: &SourceConnectionId) {
        let _ = self.repo.delete(id).await;
    }
}

impl Default for CursorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let store = CursorStore::new();
        let id = SourceConnectionId::new();
        let mut data = Map::new();
        data.insert("page_token".into(), json!("abc123"));
        store.set(id, data.clone(), Some("updated_at".into())).await;

        let cursor = store.get(&id).await.unwrap();
        assert_eq!(cursor.cursor_data, data);
        assert_eq!(cursor.cursor_field.as_deref(), Some("updated_at"));
    }

    #[tokio::test]
    async fn a_later_write_replaces_the_whole_row() {
        let store = CursorStore::new();
        let id = SourceConnectionId::new();
        let mut first = Map::new();
        first.insert("page_token".into(), json!("p1"));
        store.set(id, first, Some("a".into())).await;

        let mut second = Map::new();
        second.insert("page_token".into(), json!("p2"));
        store.set(id, second.clone(), None).await;

        let cursor = store.get(&id).await.unwrap();
        assert_eq!(cursor.cursor_data, second);
        assert_eq!(cursor.cursor_field, None);
    }

    #[tokio::test]
    async fn missing_cursor_is_none() {
        let store = CursorStore::new();
        assert!(store.get(&SourceConnectionId::new()).await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_the_row() {
        let store = CursorStore::new();
        let id = SourceConnectionId::new();
        store.set(id, Map::new(), None).await;
        store.clear(&id).await;
        assert!(store.get(&id).await.is_none());
    }
}
