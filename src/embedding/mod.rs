//! Sentence embeddings for memory content and queries.
//!
//! Everything stored or searched goes through an [`EmbeddingProvider`]. The
//! only shipped provider runs all-MiniLM-L6-v2 locally through ONNX Runtime
//! and yields 384-dimensional unit vectors, matching the `vector(384)` column.

pub mod local;

use std::sync::OnceLock;

use anyhow::Result;

/// Dimensionality of stored vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Turns text into L2-normalized vectors of [`EMBEDDING_DIM`] floats.
///
/// Calls are blocking; async callers go through `spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts at once. The default loops over [`embed`](Self::embed).
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Build the provider named in config. Fails when model files are missing.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(local::LocalEmbeddingProvider::new(config)?)),
        other => anyhow::bail!("unsupported embedding provider '{other}' (expected: local)"),
    }
}

/// Provider that loads the configured model on first use.
///
/// CLI commands that never embed (stats, forget, graph, ...) skip the model load.
pub struct LazyProvider {
    config: crate::config::EmbeddingConfig,
    inner: OnceLock<std::result::Result<Box<dyn EmbeddingProvider>, String>>,
}

impl LazyProvider {
    pub fn new(config: crate::config::EmbeddingConfig) -> Self {
        Self {
            config,
            inner: OnceLock::new(),
        }
    }

    fn provider(&self) -> Result<&dyn EmbeddingProvider> {
        self.inner
            .get_or_init(|| create_provider(&self.config).map_err(|e| format!("{e:#}")))
            .as_ref()
            .map(|p| p.as_ref())
            .map_err(|e| anyhow::anyhow!("{e}"))
    }
}

impl EmbeddingProvider for LazyProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.provider()?.embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.provider()?.embed_batch(texts)
    }
}

/// Scale a vector to unit length. A zero vector is returned unchanged.
pub fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}
