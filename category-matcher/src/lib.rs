//! Category Matcher
//!
//! Maps free text to the best-matching labels of a fixed category
//! vocabulary using sentence-embedding similarity, and stores the result as
//! a user's implicit preferences.
//!
//! ## Features
//!
//! - **Semantic ranking** - cosine similarity over all-MiniLM-L6-v2 embeddings
//! - **Deterministic top-N** - ties broken by vocabulary order
//! - **Cached label vectors** - the vocabulary is embedded once per process
//! - **RocksDB persistence** - implicit preference records keyed by user id
//!
//! ## Example
//!
//! ```ignore
//! use category_matcher::{CategoryMatcher, MiniLmEmbedding, Vocabulary};
//!
//! let model = MiniLmEmbedding::from_cache_dir(".fastembed_cache")?;
//! let matcher = CategoryMatcher::new(Arc::new(model), Vocabulary::builtin())?;
//!
//! let labels = matcher.recommend("I want tacos and margaritas", 3)?;
//! store.update_implicit_categories(&user_id, &labels)?;
//! ```

pub mod embedding;
pub mod error;
pub mod matcher;
pub mod preference;
pub mod ranker;
pub mod storage;
pub mod vocabulary;

// Re-exports for convenience
pub use embedding::{Embedder, MiniLmConfig, MiniLmEmbedding};
pub use error::{MatchError, Result};
pub use matcher::{CategoryMatcher, ScoredLabel, DEFAULT_TOP_N};
pub use preference::{PreferenceRecord, UserId};
pub use storage::{InMemoryPreferenceStore, PreferenceStore, RecordUpdate, RocksPreferenceStore};
pub use vocabulary::{Vocabulary, DEFAULT_CATEGORIES};
