//! Semantic category matcher
//!
//! Composes an [`Embedder`] with the ranker to turn free text into the
//! best-matching labels of a fixed [`Vocabulary`].

use std::sync::Arc;

use serde::Serialize;

use crate::embedding::Embedder;
use crate::error::{MatchError, Result};
use crate::ranker;
use crate::vocabulary::Vocabulary;

/// Default number of labels returned per query
pub const DEFAULT_TOP_N: usize = 3;

/// A label together with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLabel {
    pub label: String,
    pub score: f32,
}

/// Embedding-based ranking over a fixed vocabulary
///
/// Label embeddings are computed once at construction and never
/// recomputed; the vocabulary and embedder are immutable afterwards.
pub struct CategoryMatcher {
    embedder: Arc<dyn Embedder>,
    vocabulary: Vocabulary,
    label_vectors: Vec<Vec<f32>>,
}

impl CategoryMatcher {
    /// Embed the vocabulary and build the matcher
    pub fn new(embedder: Arc<dyn Embedder>, vocabulary: Vocabulary) -> Result<Self> {
        let labels: Vec<&str> = vocabulary.iter().collect();
        let label_vectors = embedder.embed_batch(&labels)?;

        if label_vectors.len() != vocabulary.len() {
            return Err(MatchError::model(format!(
                "Embedder returned {} vectors for {} labels",
                label_vectors.len(),
                vocabulary.len()
            )));
        }
        let expected = embedder.dimension();
        if let Some(bad) = label_vectors.iter().find(|v| v.len() != expected) {
            return Err(MatchError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        log::info!(
            "CategoryMatcher ready ({} labels, {} via {})",
            vocabulary.len(),
            expected,
            embedder.name()
        );

        Ok(Self {
            embedder,
            vocabulary,
            label_vectors,
        })
    }

    /// Rank the vocabulary against `text` and return the best `top_n` labels
    pub fn recommend(&self, text: &str, top_n: usize) -> Result<Vec<String>> {
        Ok(self
            .recommend_scored(text, top_n)?
            .into_iter()
            .map(|scored| scored.label)
            .collect())
    }

    /// Same ranking as [`recommend`](Self::recommend), with scores attached
    pub fn recommend_scored(&self, text: &str, top_n: usize) -> Result<Vec<ScoredLabel>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MatchError::validation("text must not be empty"));
        }
        ranker::check_top_n(top_n, self.vocabulary.len())?;

        let query = self.embedder.embed(text)?;
        if query.len() != self.embedder.dimension() {
            return Err(MatchError::DimensionMismatch {
                expected: self.embedder.dimension(),
                actual: query.len(),
            });
        }

        let ranked = ranker::rank_scored(&query, &self.label_vectors, top_n)?;
        log::debug!("Ranked {} labels for {:?}", ranked.len(), text);

        Ok(ranked
            .into_iter()
            .filter_map(|(index, score)| {
                self.vocabulary.get(index).map(|label| ScoredLabel {
                    label: label.to_string(),
                    score,
                })
            })
            .collect())
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// One axis per keyword; text scores on every axis whose keyword it contains
    struct KeywordEmbedder {
        axes: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        fn new(axes: Vec<&'static str>) -> Self {
            Self {
                axes,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Embedder for KeywordEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lower = text.to_lowercase();
            Ok(self
                .axes
                .iter()
                .map(|axis| lower.matches(axis).count() as f32)
                .collect())
        }

        fn dimension(&self) -> usize {
            self.axes.len()
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(MatchError::model("inference failed"))
        }

        fn dimension(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn food_matcher() -> CategoryMatcher {
        let embedder = KeywordEmbedder::new(vec!["taco", "mexic", "yoga", "museum", "sushi"]);
        let vocabulary =
            Vocabulary::new(["yoga", "mexican", "taco", "museums", "sushi", "mexican taco"])
                .unwrap();
        CategoryMatcher::new(Arc::new(embedder), vocabulary).unwrap()
    }

    #[test]
    fn test_recommend_ranks_related_labels_first() {
        let matcher = food_matcher();
        let result = matcher.recommend("Mexican tacos tonight", 3).unwrap();
        assert_eq!(result, vec!["mexican taco", "mexican", "taco"]);
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let matcher = food_matcher();
        let first = matcher.recommend("sushi and yoga", 4).unwrap();
        let second = matcher.recommend("sushi and yoga", 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cardinality_and_uniqueness() {
        let matcher = food_matcher();
        for n in 1..=matcher.vocabulary().len() {
            let result = matcher.recommend("taco", n).unwrap();
            assert_eq!(result.len(), n);
            let unique: std::collections::HashSet<_> = result.iter().collect();
            assert_eq!(unique.len(), n);
        }
    }

    #[test]
    fn test_full_vocabulary_is_monotonic() {
        let matcher = food_matcher();
        let scored = matcher.recommend_scored("a taco before the museum", 6).unwrap();
        assert_eq!(scored.len(), 6);
        for pair in scored.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_tie_prefers_vocabulary_order() {
        // Every label but "sushi" scores 0, so vocabulary order decides the rest
        let matcher = food_matcher();
        let result = matcher.recommend("sushi", 3).unwrap();
        assert_eq!(result, vec!["sushi", "yoga", "mexican"]);
    }

    #[test]
    fn test_single_result_is_best() {
        let matcher = food_matcher();
        assert_eq!(matcher.recommend("museum trip", 1).unwrap(), vec!["museums"]);
    }

    #[test]
    fn test_empty_text_is_validation_error() {
        let matcher = food_matcher();
        assert!(matches!(
            matcher.recommend("", 3),
            Err(MatchError::Validation(_))
        ));
        assert!(matches!(
            matcher.recommend("   ", 3),
            Err(MatchError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_top_n() {
        let matcher = food_matcher();
        assert!(matches!(
            matcher.recommend("taco", 0),
            Err(MatchError::InvalidParameter { ref got, max: 6 }) if got == "0"
        ));
        assert!(matches!(
            matcher.recommend("taco", 7),
            Err(MatchError::InvalidParameter { ref got, max: 6 }) if got == "7"
        ));
    }

    #[test]
    fn test_label_vectors_are_computed_once() {
        let embedder = Arc::new(KeywordEmbedder::new(vec!["a", "b"]));
        let vocabulary = Vocabulary::new(["a", "b", "ab"]).unwrap();
        let matcher = CategoryMatcher::new(embedder.clone(), vocabulary).unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);

        matcher.recommend("a", 2).unwrap();
        matcher.recommend("b", 2).unwrap();
        // One query embedding per call, no label re-embedding
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_model_failure_at_construction() {
        let result = CategoryMatcher::new(Arc::new(FailingEmbedder), Vocabulary::builtin());
        assert!(matches!(result, Err(MatchError::ModelUnavailable(_))));
    }

    #[test]
    #[ignore = "requires model download"]
    fn test_tacos_rank_mexican_above_unrelated() {
        use crate::embedding::{find_model_cache_dir, MiniLmEmbedding};

        let model = MiniLmEmbedding::from_cache_dir(find_model_cache_dir(None)).unwrap();
        let matcher = CategoryMatcher::new(Arc::new(model), Vocabulary::builtin()).unwrap();
        let all = matcher
            .recommend_scored("I want tacos and margaritas", matcher.vocabulary().len())
            .unwrap();

        let score = |label: &str| {
            all.iter()
                .find(|s| s.label == label)
                .map(|s| s.score)
                .unwrap()
        };
        assert!(score("mexican") > score("yoga"));
        assert!(score("mexican") > score("museums"));
        assert!(score("taco") > score("museums"));

        let top3 = matcher.recommend("I want tacos and margaritas", 3).unwrap();
        assert!(!top3.contains(&"yoga".to_string()));
        assert!(!top3.contains(&"museums".to_string()));
    }
}
