//! Per-collection embedding stamp. Once a collection has written its
//! first vector, `(model, dimensions)` is fixed for its lifetime — mixing
//! vector spaces in one index silently corrupts similarity search.

use crate::error::SyncFailureError;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmbeddingStamp {
    pub model: String,
    pub dimensions: usize,
}

impl EmbeddingStamp {
    fn describe(&self) -> String {
        format!("{}:{}", self.model, self.dimensions)
    }
}

/// Process-wide registry of stamped collections, keyed by collection id.
#[derive(Clone, Default)]
pub struct EmbeddingStampRegistry {
    stamps: Arc<DashMap<String, EmbeddingStamp>>,
}

impl EmbeddingStampRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps `collection_id` with `candidate` if unstamped; otherwise
    /// verifies `candidate` matches the existing stamp. Must be called
    /// before any chunk write lands for the batch.
    pub fn check_or_stamp(&self, collection_id: &str, candidate: EmbeddingStamp) -> Result<(), SyncFailureError> {
        match self.stamps.get(collection_id) {
            Some(existing) if *existing == candidate => Ok(()),
            Some(existing) => Err(SyncFailureError::EmbeddingConfigChanged {
                stamped: existing.describe(),
                actual: candidate.describe(),
            }),
            None => {
                self.stamps.insert(collection_id.to_string(), candidate);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_stamps_the_collection() {
        let registry = EmbeddingStampRegistry::new();
        let stamp = EmbeddingStamp { model: "text-embedding-3-small".into(), dimensions: 1536 };
        assert!(registry.check_or_stamp("coll-1", stamp).is_ok());
    }

    #[test]
    fn matching_stamp_is_a_noop() {
        let registry = EmbeddingStampRegistry::new();
        let stamp = EmbeddingStamp { model: "m".into(), dimensions: 768 };
        registry.check_or_stamp("coll-1", stamp.clone()).unwrap();
        assert!(registry.check_or_stamp("coll-1", stamp).is_ok());
    }

    #[test]
    fn dimension_change_raises_before_any_write() {
        let registry = EmbeddingStampRegistry::new();
        registry
            .check_or_stamp("coll-1", EmbeddingStamp { model: "m".into(), dimensions: 768 })
            .unwrap();

        let err = registry
            .check_or_stamp("coll-1", EmbeddingStamp { model: "m".into(), dimensions: 1536 })
            .unwrap_err();
        assert!(matches!(err, SyncFailureError::EmbeddingConfigChanged { .. }));
    }

    #[test]
    fn model_change_at_same_dimensions_still_raises() {
        let registry = EmbeddingStampRegistry::new();
        registry
            .check_or_stamp("coll-1", EmbeddingStamp { model: "m1".into(), dimensions: 1536 })
            .unwrap();

        let err = registry
            .check_or_stamp("coll-1", EmbeddingStamp { model: "m2".into(), dimensions: 1536 })
            .unwrap_err();
        assert!(matches!(err, SyncFailureError::EmbeddingConfigChanged { .. }));
    }

    #[test]
    fn distinct_collections_stamp_independently() {
        let registry = EmbeddingStampRegistry::new();
        registry
            .check_or_stamp("coll-1", EmbeddingStamp { model: "m".into(), dimensions: 768 })
            .unwrap();
        assert!(registry
            .check_or_stamp("coll-2", EmbeddingStamp { model: "m".into(), dimensions: 1536 })
            .is_ok());
    }
}
