//! Implicit preference records
//!
//! Per-user record holding the categories inferred from free text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Well-formed user identity: 24 hexadecimal characters, stored lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub const LEN: usize = 24;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != Self::LEN || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MatchError::InvalidIdentity(format!(
                "'{}' is not a {}-character hex id",
                s,
                Self::LEN
            )));
        }
        Ok(Self(s.to_ascii_lowercase()))
    }
}

/// Stored preferences for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceRecord {
    pub user_id: UserId,
    /// Last set of matched categories, best match first
    pub implicit_categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    /// When `implicit_categories` last changed
    pub updated_at: Option<DateTime<Utc>>,
}

impl PreferenceRecord {
    /// Empty record for a newly registered user
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            implicit_categories: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Overwrite the implicit categories
    ///
    /// Returns false, leaving the record untouched, when the categories are
    /// already stored.
    pub fn set_implicit_categories(&mut self, categories: &[String]) -> bool {
        if self.implicit_categories == categories {
            return false;
        }
        self.implicit_categories = categories.to_vec();
        self.updated_at = Some(Utc::now());
        true
    }
}
