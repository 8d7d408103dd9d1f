//! Embedding module for semantic matching
//!
//! Uses all-MiniLM-L6-v2 sentence embeddings (384 dimensions).

mod discovery;
mod minilm;

pub use discovery::find_model_cache_dir;
pub use minilm::{MiniLmConfig, MiniLmEmbedding};

use crate::error::Result;

/// Deterministic text to vector mapping
///
/// For fixed model parameters `embed` must return the same vector for the
/// same text. Implementations are shared read-only across requests.
pub trait Embedder: Send + Sync {
    /// Embed a single non-empty text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per input, in input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Model name, for logs and health output
    fn name(&self) -> &str;
}
