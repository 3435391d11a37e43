pub mod chunk;
pub mod embed;
pub mod text;

pub use chunk::{chunk_code, chunk_semantic, Chunk, CodeChunker};
pub use embed::{
    embed_dense_validated, pack_int8_projection, subbatch, DenseEmbedder, DenseProjection,
    EmbeddingError, SparseEmbedder, MAX_TEXTS_PER_SUBBATCH, MAX_TOKENS_PER_REQUEST,
};
pub use text::build_textual_representation;
