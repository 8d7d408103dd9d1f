//! all-MiniLM-L6-v2 sentence embeddings
//!
//! Runs the sentence-transformer locally through fastembed (ONNX Runtime).
//! Model files are downloaded into the cache directory on first load.

use std::path::PathBuf;

use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::Embedder;
use crate::error::{MatchError, Result};

/// MiniLM configuration
#[derive(Debug, Clone)]
pub struct MiniLmConfig {
    /// Directory holding downloaded model files
    pub cache_dir: PathBuf,
    /// Maximum sequence length (default: 256)
    pub max_length: usize,
    /// Batch size for encoding (default: 256)
    pub batch_size: usize,
    /// Print download progress on first load
    pub show_download_progress: bool,
}

impl Default for MiniLmConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".fastembed_cache"),
            max_length: 256,
            batch_size: 256,
            show_download_progress: false,
        }
    }
}

/// all-MiniLM-L6-v2 embedding model wrapper
///
/// Produces 384-dimensional, L2-normalized sentence embeddings.
/// Inference is serialized behind a mutex; the ONNX session is shared
/// by every request.
pub struct MiniLmEmbedding {
    model: Mutex<TextEmbedding>,
    config: MiniLmConfig,
    dimension: usize,
}

impl MiniLmEmbedding {
    /// Load the model into the given cache directory
    pub fn from_cache_dir(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(MiniLmConfig {
            cache_dir: cache_dir.into(),
            ..MiniLmConfig::default()
        })
    }

    /// Load the model with custom configuration
    pub fn with_config(config: MiniLmConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.cache_dir)?;

        log::info!(
            "Loading all-MiniLM-L6-v2 (cache: {})",
            config.cache_dir.display()
        );

        let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_cache_dir(config.cache_dir.clone())
            .with_max_length(config.max_length)
            .with_show_download_progress(config.show_download_progress);

        let model = TextEmbedding::try_new(options)
            .map_err(|e| MatchError::model(format!("Failed to load all-MiniLM-L6-v2: {}", e)))?;

        // Get dimension by encoding test string
        let test_embed = model
            .embed(vec!["test"], None)
            .map_err(|e| MatchError::model(format!("Failed to encode test string: {}", e)))?;
        let dimension = test_embed.first().map(Vec::len).unwrap_or_default();
        if dimension == 0 {
            return Err(MatchError::model("Model returned an empty embedding"));
        }

        log::info!(
            "Loaded all-MiniLM-L6-v2 ({}d, max {} tokens)",
            dimension,
            config.max_length
        );

        Ok(Self {
            model: Mutex::new(model),
            config,
            dimension,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &MiniLmConfig {
        &self.config
    }
}

impl Embedder for MiniLmEmbedding {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self
            .model
            .lock()
            .embed(vec![text], None)
            .map_err(|e| MatchError::model(format!("Failed to encode text: {}", e)))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MatchError::model("Model returned no embedding"))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let embeddings = self
            .model
            .lock()
            .embed(texts.to_vec(), Some(self.config.batch_size))
            .map_err(|e| MatchError::model(format!("Failed to encode texts: {}", e)))?;

        if embeddings.len() != texts.len() {
            return Err(MatchError::model(format!(
                "Model returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings)
    }

    /// 384 for all-MiniLM-L6-v2
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }
}
