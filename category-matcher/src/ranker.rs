//! Top-N semantic selection
//!
//! Scores every candidate against the query with cosine similarity and
//! keeps the N best. Equal scores keep vocabulary order.

use std::cmp::Ordering;

use crate::error::{MatchError, Result};

/// Calculate cosine similarity between two vectors
///
/// Mismatched lengths and zero-norm vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Score every candidate, in candidate order
pub fn score_all(query: &[f32], candidates: &[Vec<f32>]) -> Vec<f32> {
    candidates
        .iter()
        .map(|candidate| cosine_similarity(query, candidate))
        .collect()
}

/// Check `1 <= top_n <= candidate_count`
pub fn check_top_n(top_n: usize, candidate_count: usize) -> Result<()> {
    if top_n == 0 || top_n > candidate_count {
        return Err(MatchError::InvalidParameter {
            got: top_n.to_string(),
            max: candidate_count,
        });
    }
    Ok(())
}

/// Rank candidates and return the best `top_n` as `(index, score)` pairs
pub fn rank_scored(
    query: &[f32],
    candidates: &[Vec<f32>],
    top_n: usize,
) -> Result<Vec<(usize, f32)>> {
    check_top_n(top_n, candidates.len())?;

    let mut scored: Vec<(usize, f32)> = score_all(query, candidates)
        .into_iter()
        .enumerate()
        .collect();

    // Stable sort keeps vocabulary order among equal scores
    scored.sort_by(|a, b| descending(a.1, b.1));
    scored.truncate(top_n);
    Ok(scored)
}

/// Rank candidates and return the indices of the best `top_n`
pub fn rank(query: &[f32], candidates: &[Vec<f32>], top_n: usize) -> Result<Vec<usize>> {
    Ok(rank_scored(query, candidates, top_n)?
        .into_iter()
        .map(|(index, _)| index)
        .collect())
}

/// Descending order with NaN treated as the lowest score
fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
