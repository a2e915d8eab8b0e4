//! Local word-overlap scorer.
//!
//! Scores by set overlap of the tokens produced by [`tokenize`]:
//! `rate = |O ∩ U| / max(|O|, |U|) * 100`, rounded to two decimals.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::ScoringError;
use crate::tokenizer::tokenize;
use crate::traits::{MatchEngine, MatchResult};

/// Maximum number of words reported in each keyword list.
pub const KEYWORD_LIMIT: usize = 10;

/// Cheap lexical scorer; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapEngine;

impl OverlapEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MatchEngine for OverlapEngine {
    fn name(&self) -> &str {
        "overlap"
    }

    async fn analyze(&self, original: &str, user: &str) -> Result<MatchResult, ScoringError> {
        Ok(score_overlap(original, user))
    }
}

/// Compute the overlap score synchronously.
///
/// Keyword lists follow first-occurrence order: matches and misses in the
/// order they appear in `original`, extras in the order they appear in `user`.
pub fn score_overlap(original: &str, user: &str) -> MatchResult {
    let o_words = distinct_in_order(tokenize(original));
    let u_words = distinct_in_order(tokenize(user));

    let o_set: HashSet<&str> = o_words.iter().map(String::as_str).collect();
    let u_set: HashSet<&str> = u_words.iter().map(String::as_str).collect();

    let matched: Vec<&String> = o_words.iter().filter(|w| u_set.contains(w.as_str())).collect();
    let missed: Vec<&String> = o_words.iter().filter(|w| !u_set.contains(w.as_str())).collect();
    let extra: Vec<&String> = u_words.iter().filter(|w| !o_set.contains(w.as_str())).collect();

    let denominator = o_words.len().max(u_words.len());
    let matching_rate = if denominator == 0 {
        0.0
    } else {
        round2(matched.len() as f64 / denominator as f64 * 100.0)
    };

    MatchResult {
        matching_rate,
        total_original_words: o_words.len(),
        total_user_words: u_words.len(),
        matched_words: matched.len(),
        keyword_matches: take_limited(&matched),
        missed_keywords: take_limited(&missed),
        extra_keywords: take_limited(&extra),
        original_length: original.chars().count(),
        user_length: user.chars().count(),
    }
}

fn distinct_in_order(words: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    words
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

fn take_limited(words: &[&String]) -> Vec<String> {
    words
        .iter()
        .take(KEYWORD_LIMIT)
        .map(|w| (*w).clone())
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
