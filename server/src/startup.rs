//! Startup wiring
//!
//! Loads the embedding model, embeds the vocabulary and opens the
//! preference store. A model failure here is fatal to the process.

use std::sync::Arc;

use category_matcher::embedding::find_model_cache_dir;
use category_matcher::{
    CategoryMatcher, InMemoryPreferenceStore, MatchError, MiniLmEmbedding, PreferenceStore,
    RocksPreferenceStore, Vocabulary,
};

use crate::config::ServerConfig;

/// Load all-MiniLM-L6-v2 and embed the built-in vocabulary
///
/// Runs on the blocking pool: the first start downloads model files.
pub async fn load_matcher(config: &ServerConfig) -> Result<Arc<CategoryMatcher>, MatchError> {
    let cache_dir = find_model_cache_dir(config.model_cache.as_deref());
    tracing::info!("[startup] Loading embedding model (cache: {:?})", cache_dir);

    let matcher = tokio::task::spawn_blocking(move || {
        let model = MiniLmEmbedding::from_cache_dir(cache_dir)?;
        CategoryMatcher::new(Arc::new(model), Vocabulary::builtin())
    })
    .await
    .map_err(|e| MatchError::model(format!("Model loading task failed: {}", e)))??;

    tracing::info!(
        "[startup] Matcher ready: {} labels, {}d",
        matcher.vocabulary().len(),
        matcher.dimension()
    );
    Ok(Arc::new(matcher))
}

/// Open the configured preference store
pub fn open_store(config: &ServerConfig) -> Result<Arc<dyn PreferenceStore>, MatchError> {
    if config.ephemeral {
        tracing::warn!("[startup] Using in-memory preference store; records are lost on exit");
        return Ok(Arc::new(InMemoryPreferenceStore::new()));
    }

    tracing::info!("[startup] Opening preference store at {:?}", config.db_path);
    let store = RocksPreferenceStore::open(&config.db_path).map_err(|e| {
        tracing::error!("[startup] Preference store failed to open: {}", e);
        e
    })?;
    Ok(Arc::new(store))
}
