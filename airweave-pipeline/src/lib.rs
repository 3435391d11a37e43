//! Hash-based change detection, content processing, and all-or-nothing
//! destination dispatch for a single sync run.

pub mod action;
pub mod circuit_breaker;
pub mod content;
pub mod dispatch;
pub mod embedding_stamp;
pub mod error;
pub mod hash;
pub mod progress;
pub mod retry;

pub mod prelude {
    pub use crate::action::{apply_collection_dedup, resolve_batch, EntityAction, ExistingRecord, ResolvedEntity};
    pub use crate::circuit_breaker::{CircuitBreaker, Permit};
    pub use crate::content::{
        chunk_code, chunk_semantic, build_textual_representation, embed_dense_validated,
        pack_int8_projection, subbatch, Chunk, CodeChunker, DenseEmbedder, DenseProjection,
        EmbeddingError, SparseEmbedder,
    };
    pub use crate::dispatch::{cleanup_orphans, dispatch_batch, ChunkWrite, DestinationHandler, MetadataHandler};
    pub use crate::embedding_stamp::{EmbeddingStamp, EmbeddingStampRegistry};
    pub use crate::error::{ProviderError, SyncFailureError};
    pub use crate::hash::content_hash;
    pub use crate::progress::{CounterKind, SyncCounters, SyncJobStatus, SyncProgress};
    pub use crate::retry::{retry_provider_call, RetryPolicy};
}
