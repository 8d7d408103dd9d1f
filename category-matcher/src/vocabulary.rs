//! Fixed category vocabulary
//!
//! The ordered label set the matcher ranks against. Position in the
//! vocabulary is the tie-break order for equal similarity scores.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{MatchError, Result};

/// Built-in categories: cuisines, then activities, then venues.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    // Cuisines
    "italian", "mexican", "sushi", "bbq", "vegan", "fast food", "pizza", "indian",
    "latin fusion", "taco", "thai", "chinese", "mediterranean", "greek", "french",
    "japanese", "korean", "vietnamese", "lebanese", "cuban", "caribbean", "ethiopian",
    "afghan", "turkish", "noodles", "burgers", "ramen", "steakhouse", "seafood",
    "southern", "middle eastern", "brunch", "brazilian", "peruvian", "tapas",
    "dumplings", "poke", "halal", "gluten free", "comfort food", "street food",
    "gastropub", "new american", "kebab", "bagels", "sandwiches", "salad",
    "food trucks", "bistro", "organic", "deli", "creole", "cajun", "irish", "german",
    "nepalese", "moroccan", "pakistani", "filipino", "malaysian", "fusion",
    // Activities
    "billiards", "poolhalls", "bowling", "yoga", "pilates", "rockclimbing", "painting",
    "rock climbing", "movies", "swimming", "dancing", "arcade", "escape room",
    "karaoke", "golf", "mini golf", "go kart", "trampoline park", "laser tag",
    "ice skating", "roller skating", "ziplining", "pottery", "wine tasting",
    "beer tasting", "board games", "virtual reality", "indoor skydiving", "archery",
    "axe throwing",
    // Venues
    "parks", "museums", "landmarks", "beaches", "zoos", "libraries", "gardens",
    "aquariums", "piers", "observatories", "monuments", "cathedrals", "bridges",
    "harbors", "galleries", "historic sites", "botanical gardens", "stadiums",
    "arenas", "islands", "memorials", "conservatories", "clubs", "bars", "cafes",
    "cafe", "bakery",
    // Fitness
    "running", "walking", "hiking", "jogging", "exercise", "fitness", "sports",
];

/// Immutable, ordered, duplicate-free label set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Vocabulary {
    labels: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary, rejecting empty sets, blank labels and duplicates
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(MatchError::vocabulary("vocabulary must not be empty"));
        }

        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if label.trim().is_empty() {
                return Err(MatchError::vocabulary("labels must not be blank"));
            }
            if !seen.insert(label.as_str()) {
                return Err(MatchError::vocabulary(format!("duplicate label '{}'", label)));
            }
        }

        Ok(Self { labels })
    }

    /// The built-in category vocabulary
    pub fn builtin() -> Self {
        Self {
            labels: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed vocabulary
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}
