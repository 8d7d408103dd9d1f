//! Model cache discovery
//!
//! Decides where embedding model files are downloaded and reused from.

use std::path::{Path, PathBuf};

/// Environment variable overriding the model cache location
pub const MODEL_CACHE_ENV: &str = "CATEGORY_MODEL_CACHE";

/// Find the model cache directory with priority:
/// 1. Explicit path (command line)
/// 2. CATEGORY_MODEL_CACHE environment variable
/// 3. User home directory (~/.category-matcher/models)
/// 4. `.fastembed_cache` in the working directory
pub fn find_model_cache_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        log::info!("Using model cache: {}", path.display());
        return path.to_path_buf();
    }

    if let Ok(cache) = std::env::var(MODEL_CACHE_ENV) {
        if !cache.trim().is_empty() {
            log::info!("Using {}: {}", MODEL_CACHE_ENV, cache);
            return PathBuf::from(cache);
        }
        log::warn!("{} is set but empty, ignoring", MODEL_CACHE_ENV);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        let user_path = PathBuf::from(home)
            .join(".category-matcher")
            .join("models");
        log::info!("Using user model cache: {}", user_path.display());
        return user_path;
    }

    PathBuf::from(".fastembed_cache")
}
