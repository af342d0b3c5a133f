//! The embedding contract: `text -> float[D]`, swappable behind a trait.
//!
//! Grounded on the teacher's `embeddings/provider.rs` (`EmbeddingProvider`
//! async trait with a default batch impl) and `embeddings/mock_model.rs`
//! (a deterministic hash-based mock used in tests and as a drop-in when no
//! real model is configured).

use async_trait::async_trait;

use crate::error::Result;

/// A `text -> float[D]` embedder. `D` is fixed and known at startup.
/// Implementations are expected to return L2-normalized vectors; search
/// still works if they don't, but score ordering degrades.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// The fixed embedding dimension this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed one piece of text.
    ///
    /// # Errors
    /// Implementations may fail for model/backend-specific reasons; a
    /// failure here is treated as non-fatal by callers (the node is
    /// created without an embedding).
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. The default implementation calls
    /// [`Embedder::embed`] sequentially; real providers should override
    /// this with a true batched call.
    ///
    /// # Errors
    /// Propagates the first failure from the underlying per-item embed.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// A deterministic, hash-based mock embedder: no model, no I/O, same text
/// always produces the same unit vector. Useful for tests and for running
/// the service without a real embedding backend configured.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    /// Create a mock embedder producing `dimension`-length vectors.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut seed = hasher.finish();

        let mut values = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let unit = (seed >> 16) as f64 / u64::from(u32::MAX) as f64;
            values.push((unit * 2.0 - 1.0) as f32);
        }
        normalize(&values)
    }
}

fn normalize(values: &[f32]) -> Vec<f32> {
    let norm: f32 = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        let mut v = vec![0.0; values.len()];
        if !v.is_empty() {
            v[0] = 1.0;
        }
        return v;
    }
    values.iter().map(|v| v / norm).collect()
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.generate(text))
    }
}
