//! A generic in-memory `Repository` used by every subsystem's test suite,
//! with the same shape a SQL-backed repository would have minus the real
//! backend.

use crate::error::DataError;
use crate::repository::Repository;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

#[derive(Clone)]
pub struct InMemoryRepository<T, ID> {
    rows: Arc<DashMap<ID, T>>,
    id_of: fn(&T) -> ID,
}

impl<T, ID> InMemoryRepository<T, ID>
where
    T: Clone + Send + Sync + 'static,
    ID: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new(id_of: fn(&T) -> ID) -> Self {
        Self {
            rows: Arc::new(DashMap::new()),
            id_of,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Snapshot all rows matching a predicate (used by orphan-detection
    /// passes that scan by `sync_id` etc. rather than by primary key).
    pub fn find_where(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .iter()
            .filter(|e| pred(e.value()))
            .map(|e| e.value().clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl<T, ID> Repository<T, ID> for InMemoryRepository<T, ID>
where
    T: Clone + Send + Sync + 'static,
    ID: Eq + Hash + Clone + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: &ID) -> Result<Option<T>, DataError> {
        Ok(self.rows.get(id).map(|e| e.value().clone()))
    }

    async fn find_all(&self) -> Result<Vec<T>, DataError> {
        Ok(self.rows.iter().map(|e| e.value().clone()).collect())
    }

    async fn save(&self, entity: T) -> Result<T, DataError> {
        let id = (self.id_of)(&entity);
        self.rows.insert(id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: &ID) -> Result<bool, DataError> {
        Ok(self.rows.remove(id).is_some())
    }

    async fn count(&self) -> Result<u64, DataError> {
        Ok(self.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: u32,
        name: String,
    }

    #[tokio::test]
    async fn save_find_delete_roundtrip() {
        let repo: InMemoryRepository<Row, u32> = InMemoryRepository::new(|r| r.id);
        repo.save(Row {
            id: 1,
            name: "a".into(),
        })
        .await
        .unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);
        let found = repo.find_by_id(&1).await.unwrap().unwrap();
        assert_eq!(found.name, "a");
        assert!(repo.delete(&1).await.unwrap());
        assert!(repo.find_by_id(&1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_where_filters_by_predicate() {
        let repo: InMemoryRepository<Row, u32> = InMemoryRepository::new(|r| r.id);
        repo.save(Row { id: 1, name: "a".into() }).await.unwrap();
        repo.save(Row { id: 2, name: "b".into() }).await.unwrap();
        let matches = repo.find_where(|r| r.name == "a");
        assert_eq!(matches.len(), 1);
    }
}
