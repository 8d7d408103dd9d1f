//! Recommendation service
//!
//! Validates a request, runs the matcher and records the result as the
//! user's implicit categories. A failed save never discards the ranking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use category_matcher::{CategoryMatcher, MatchError, PreferenceStore};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// Ranking budget when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of `POST /api/recommend`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub user_id: String,
    /// Raw JSON value, classified by [`RecommendationService::validate`].
    /// Absent or null falls back to the configured default.
    #[serde(default)]
    pub top_n: Option<Value>,
}

/// Whether the ranked labels reached the preference store
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceStatus {
    Saved,
    NotSaved { reason: String },
}

impl PersistenceStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistenceStatus::Saved)
    }
}

/// Ranked labels plus the outcome of saving them
#[derive(Debug, Clone)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<String>,
    pub persistence: PersistenceStatus,
}

/// Sets the flag when the request future is dropped mid-flight
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Shared matcher and store for the HTTP handlers and CLI
pub struct RecommendationService {
    matcher: Arc<CategoryMatcher>,
    store: Arc<dyn PreferenceStore>,
    default_top_n: usize,
    request_timeout: Duration,
}

impl RecommendationService {
    pub fn new(
        matcher: Arc<CategoryMatcher>,
        store: Arc<dyn PreferenceStore>,
        default_top_n: usize,
    ) -> Self {
        Self {
            matcher,
            store,
            default_top_n,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound the time spent ranking a single request
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn matcher(&self) -> &CategoryMatcher {
        &self.matcher
    }

    pub fn store(&self) -> &dyn PreferenceStore {
        self.store.as_ref()
    }

    /// Check the request before any embedding work; returns the effective top-N
    ///
    /// `topN` must be a JSON integer in `[1, vocabulary size]`. Floats, strings
    /// and out-of-range numbers are all `InvalidParameter`.
    pub fn validate(&self, request: &RecommendRequest) -> Result<usize, MatchError> {
        if request.text.trim().is_empty() {
            return Err(MatchError::validation("Missing 'text' in request"));
        }
        if request.user_id.trim().is_empty() {
            return Err(MatchError::validation("Missing 'userId' in request"));
        }

        let max = self.matcher.vocabulary().len();
        let top_n = match &request.top_n {
            None => Some(self.default_top_n),
            Some(value) => value.as_i64().and_then(|n| usize::try_from(n).ok()),
        };
        match top_n {
            Some(top_n) if (1..=max).contains(&top_n) => Ok(top_n),
            _ => Err(MatchError::InvalidParameter {
                got: request
                    .top_n
                    .as_ref()
                    .map_or_else(|| self.default_top_n.to_string(), Value::to_string),
                max,
            }),
        }
    }

    /// Rank the request text and overwrite the user's implicit categories
    ///
    /// Only the ranking is bounded by the request timeout; on expiry nothing
    /// is saved and [`ApiError::Timeout`] is returned. Once ranked, the save
    /// is awaited, and a request dropped before the write lands leaves the
    /// store untouched. Store failures are reported through
    /// [`PersistenceStatus::NotSaved`].
    pub async fn recommend(&self, request: RecommendRequest) -> ApiResult<RecommendationOutcome> {
        let top_n = self.validate(&request)?;

        let matcher = Arc::clone(&self.matcher);
        let text = request.text;
        let ranking = tokio::task::spawn_blocking(move || matcher.recommend(&text, top_n));
        let recommendations = match tokio::time::timeout(self.request_timeout, ranking).await {
            Ok(joined) => joined
                .map_err(|e| MatchError::model(format!("Matcher task failed: {}", e)))??,
            Err(_) => {
                tracing::warn!("Ranking exceeded {:?}; nothing saved", self.request_timeout);
                return Err(ApiError::Timeout(format!(
                    "Ranking did not finish within {:?}",
                    self.request_timeout
                )));
            }
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let _cancel_on_drop = CancelOnDrop(Arc::clone(&cancelled));

        let store = Arc::clone(&self.store);
        let user_id = request.user_id;
        let categories = recommendations.clone();
        let saved = tokio::task::spawn_blocking(move || {
            store.update_implicit_categories_unless(&user_id, &categories, &cancelled)
        })
        .await;

        let persistence = match saved {
            Ok(Ok(())) => PersistenceStatus::Saved,
            Ok(Err(e)) => {
                tracing::warn!("Failed to update implicit categories: {}", e);
                PersistenceStatus::NotSaved {
                    reason: e.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!("Preference update task failed: {}", e);
                PersistenceStatus::NotSaved {
                    reason: e.to_string(),
                }
            }
        };

        Ok(RecommendationOutcome {
            recommendations,
            persistence,
        })
    }
}
