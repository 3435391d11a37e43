//! Generic async repository trait.

use crate::error::DataError;

#[async_trait::async_trait]
pub trait Repository<T, ID>: Send + Sync
where
    T: Send + Sync + Clone + 'static,
    ID: Send + Sync + 'static,
{
    async fn find_by_id(&self, id: &ID) -> Result<Option<T>, DataError>;
    async fn find_all(&self) -> Result<Vec<T>, DataError>;
    async fn save(&self, entity: T) -> Result<T, DataError>;
    async fn delete(&self, id: &ID) -> Result<bool, DataError>;
    async fn count(&self) -> Result<u64, DataError>;
}
