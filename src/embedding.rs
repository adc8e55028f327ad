//! Text embeddings for the semantic index.
//!
//! The index stores one vector per return order and scores queries by cosine
//! similarity. Vectors come from an [`Embedder`], with [`HashEmbedder`] as
//! the built-in implementation: a deterministic feature-hashing scheme that
//! needs no model download and produces identical vectors across runs and
//! hosts, which keeps stored embeddings comparable to fresh query
//! embeddings.

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

/// Dimension of vectors produced by [`HashEmbedder`].
pub const EMBEDDING_DIMENSION: usize = 256;

/// Produces fixed-dimension vectors for index content and queries.
pub trait Embedder: Send + Sync {
    /// Stable identifier recorded for diagnostics.
    fn id(&self) -> &'static str;

    /// Output vector dimension.
    fn dimension(&self) -> usize;

    /// Embeds `text` into a vector of [`Self::dimension`] length.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Feature-hashing embedder over lowercase alphanumeric tokens.
///
/// Each token hashes to a bucket and a sign; token counts accumulate into
/// the bucket and the final vector is L2-normalized. Identical input always
/// produces an identical vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbedder;

impl Embedder for HashEmbedder {
    fn id(&self) -> &'static str {
        "hash-v1"
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    #[allow(clippy::cast_possible_truncation)]
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; EMBEDDING_DIMENSION];
        for token in tokenize(text) {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let h = hasher.finish();
            // Modulo keeps the bucket inside the vector, so the cast is safe.
            let bucket = (h % EMBEDDING_DIMENSION as u64) as usize;
            let sign = if h & (1u64 << 63) == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        normalize(&mut vector);
        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity between two vectors.
///
/// Returns `0.0` for zero-norm or mismatched-length inputs.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Serializes a vector to little-endian `f32` bytes for BLOB storage.
#[must_use]
pub fn embedding_to_bytes(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for v in vector {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Deserializes little-endian `f32` bytes back into a vector.
///
/// Trailing bytes that do not fill a whole `f32` are ignored.
#[must_use]
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Creates the default embedder used by the data agent and seeding.
#[must_use]
pub fn create_embedder() -> Arc<dyn Embedder> {
    Arc::new(HashEmbedder)
}
