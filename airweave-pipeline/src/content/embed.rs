//! Dense + sparse embedding, batched under a token budget.

use airweave_source::SparseEmbedding;
use async_trait::async_trait;
use serde_json::Value;

pub const MAX_TOKENS_PER_REQUEST: usize = 8_000;
pub const MAX_TEXTS_PER_SUBBATCH: usize = 200;
/// Crude chars-per-token estimate used only to decide sub-batch splits;
/// the embedder itself is the source of truth for actual token counts.
const CHARS_PER_TOKEN_ESTIMATE: usize = 4;

#[derive(Debug)]
pub enum EmbeddingError {
    DimensionMismatch { returned: usize, expected: usize },
    Provider(String),
}

impl std::fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingError::DimensionMismatch { returned, expected } => {
                write!(f, "embedder returned {returned}-dim vector, expected {expected}")
            }
            EmbeddingError::Provider(msg) => write!(f, "embedding provider error: {msg}"),
        }
    }
}

impl std::error::Error for EmbeddingError {}

#[async_trait]
pub trait DenseEmbedder: Send + Sync {
    fn model_name(&self) -> &str;
    fn vector_size(&self) -> usize;
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[async_trait]
pub trait SparseEmbedder: Send + Sync {
    async fn embed(&self, value: &Value) -> Result<SparseEmbedding, EmbeddingError>;
}

fn estimate_tokens(text: &str) -> usize {
    (text.len() / CHARS_PER_TOKEN_ESTIMATE).max(1)
}

/// Splits `texts` into sub-batches of at most `MAX_TEXTS_PER_SUBBATCH`
/// items that additionally respect `MAX_TOKENS_PER_REQUEST`. A single text
/// that alone exceeds the token budget still gets its own one-item batch
/// rather than erroring — the embedder is expected to truncate or reject
/// it on its own terms.
pub fn subbatch(texts: &[String]) -> Vec<Vec<usize>> {
    let mut batches = Vec::new();
    let mut current = Vec::new();
    let mut current_tokens = 0usize;

    for (idx, text) in texts.iter().enumerate() {
        let tokens = estimate_tokens(text);
        let would_overflow_tokens = current_tokens + tokens > MAX_TOKENS_PER_REQUEST && !current.is_empty();
        let would_overflow_count = current.len() >= MAX_TEXTS_PER_SUBBATCH;
        if would_overflow_tokens || would_overflow_count {
            batches.push(std::mem::take(&mut current));
            current_tokens = 0;
        }
        current.push(idx);
        current_tokens += tokens;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}

/// Embeds `texts` densely, sub-batching per [`subbatch`], validating every
/// returned vector matches `embedder.vector_size()`.
pub async fn embed_dense_validated(
    embedder: &dyn DenseEmbedder,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut out = vec![Vec::new(); texts.len()];
    for batch_indices in subbatch(texts) {
        let batch_texts: Vec<String> = batch_indices.iter().map(|&i| texts[i].clone()).collect();
        let vectors = embedder.embed_batch(&batch_texts).await?;
        if vectors.len() != batch_indices.len() {
            return Err(EmbeddingError::Provider(format!(
                "embedder returned {} vectors for {} texts",
                vectors.len(),
                batch_indices.len()
            )));
        }
        for (i, vector) in batch_indices.into_iter().zip(vectors) {
            if vector.len() != embedder.vector_size() {
                return Err(EmbeddingError::DimensionMismatch {
                    returned: vector.len(),
                    expected: embedder.vector_size(),
                });
            }
            out[i] = vector;
        }
    }
    Ok(out)
}

/// A destination-specific capability, not a global mode switch: most
/// destinations take the raw float vector; Vespa additionally wants a
/// sign-packed int8 projection for its ANN index.
#[derive(Debug, Clone, PartialEq)]
pub enum DenseProjection {
    Float(Vec<f32>),
    Int8Packed(Vec<i8>),
}

/// `packed_bits(v > 0)`: one bit per dimension, 8 dimensions per byte,
/// reinterpreted as signed bytes the way Vespa's binary field expects.
pub fn pack_int8_projection(vector: &[f32]) -> Vec<i8> {
    vector
        .chunks(8)
        .map(|chunk| {
            let mut byte: u8 = 0;
            for (bit, value) in chunk.iter().enumerate() {
                if *value > 0.0 {
                    byte |= 1 << bit;
                }
            }
            byte as i8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeEmbedder {
        dims: usize,
    }

    #[async_trait]
    impl DenseEmbedder for FakeEmbedder {
        fn model_name(&self) -> &str {
            "fake-embedder"
        }
        fn vector_size(&self) -> usize {
            self.dims
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.1; self.dims]).collect())
        }
    }

    #[tokio::test]
    async fn embeds_every_text_with_correct_dimension() {
        let embedder = FakeEmbedder { dims: 384 };
        let texts: Vec<String> = (0..450).map(|i| format!("text-{i}")).collect();
        let result = embed_dense_validated(&embedder, &texts).await.unwrap();
        assert_eq!(result.len(), 450);
        assert!(result.iter().all(|v| v.len() == 384));
    }

    #[test]
    fn subbatch_respects_text_count_cap() {
        let texts: Vec<String> = (0..450).map(|i| format!("t{i}")).collect();
        let batches = subbatch(&texts);
        assert!(batches.iter().all(|b| b.len() <= MAX_TEXTS_PER_SUBBATCH));
        let total: usize = batches.iter().map(|b| b.len()).sum();
        assert_eq!(total, 450);
    }

    #[test]
    fn a_single_oversized_text_still_gets_its_own_batch() {
        let huge = "x".repeat(MAX_TOKENS_PER_REQUEST * CHARS_PER_TOKEN_ESTIMATE * 2);
        let texts = vec![huge];
        let batches = subbatch(&texts);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![0]);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_reported() {
        struct WrongDims;
        #[async_trait]
        impl DenseEmbedder for WrongDims {
            fn model_name(&self) -> &str {
                "wrong"
            }
            fn vector_size(&self) -> usize {
                384
            }
            async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
                Ok(texts.iter().map(|_| vec![0.0; 10]).collect())
            }
        }
        let err = embed_dense_validated(&WrongDims, &["hi".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { .. }));
    }

    #[test]
    fn int8_projection_packs_sign_bits() {
        let vector = vec![1.0, -1.0, 0.5, -0.5, 0.0, 2.0, -2.0, 3.0];
        let packed = pack_int8_projection(&vector);
        assert_eq!(packed.len(), 1);
        // bits set for indices 0,2,5,7 (positive values) -> 0b10100101 = 0xA5 -> as i8 = -91
        assert_eq!(packed[0], 0b10100101u8 as i8);
    }
}
