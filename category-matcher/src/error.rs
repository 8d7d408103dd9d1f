//! Error types for category-matcher

use thiserror::Error;

/// Errors that can occur while matching or persisting categories
#[derive(Debug, Error)]
pub enum MatchError {
    /// Rejected input (empty text, missing identity)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Embedding model failed to load or to run inference
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// `top_n` outside `[1, vocabulary size]` or not an integer
    ///
    /// `got` carries the rejected value as the caller sent it.
    #[error("Invalid parameter: top_n must be between 1 and {max}, got {got}")]
    InvalidParameter { got: String, max: usize },

    /// Vocabulary violates its construction invariants
    #[error("Invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    /// Embedder produced vectors of inconsistent length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Identity string is not a well-formed user id
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// No preference record exists for the identity
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// Store update did not apply
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// RocksDB error
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),

    /// Serialization error (bincode)
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MatchError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a vocabulary error
    pub fn vocabulary(msg: impl Into<String>) -> Self {
        Self::InvalidVocabulary(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// True for failures that belong to the preference store rather than the matcher
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentity(_)
                | Self::UnknownUser(_)
                | Self::Persistence(_)
                | Self::Storage(_)
                | Self::Bincode(_)
                | Self::Io(_)
        )
    }
}

/// Result type for matcher operations
pub type Result<T> = std::result::Result<T, MatchError>;
