//! Smoothed log-likelihoods and their conversion into normalized scores.
//!
//! For every category `c` the engine computes
//!
//! ```text
//! raw[c] = prior(c) + Σ ln((count(c, t) + k) / (total_tokens(c) + k * V))
//! ```
//!
//! and then turns the (negative) log scores into positive scores that sum to
//! one without exponentiating them:
//!
//! ```text
//! normalizer      = Σ raw[c]
//! intermediate[c] = normalizer / raw[c]
//! final[c]        = intermediate[c] / Σ intermediate
//! ```
//!
//! The smallest magnitude log score is the most likely category, so dividing
//! the sum by each score flips the ordering while keeping relative distances.
//! For raw scores `-1, -1, -2` this yields `0.4, 0.4, 0.2`. This is not a
//! softmax and its outputs differ numerically from one.

use std::collections::BTreeMap;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::classifier::config::ClassifierConfig;
use crate::error::{NBayesError, Result};
use crate::store::CategoryStore;
use crate::token::Token;

/// Classification result: category name to normalized score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scores {
    scores: BTreeMap<String, f64>,
}

impl Scores {
    /// Score of a category.
    pub fn get(&self, category: &str) -> Option<f64> {
        self.scores.get(category).copied()
    }

    /// Category with the greatest score.
    ///
    /// Ties resolve to the tied category that sorts last by name.
    pub fn max(&self) -> Option<&str> {
        self.scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(category, _)| category.as_str())
    }

    /// Iterate over `(category, score)` pairs in category name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.scores
            .iter()
            .map(|(category, score)| (category.as_str(), *score))
    }

    /// Sum of all scores; 1 within floating tolerance for a non-empty result.
    pub fn total(&self) -> f64 {
        self.scores.values().sum()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, f64> {
        self.scores
    }
}

impl Index<&str> for Scores {
    type Output = f64;

    /// Returns the score of a category.
    ///
    /// # Panics
    ///
    /// Panics if the category is not present in the result. Use
    /// [`Scores::get`] for a non-panicking lookup.
    fn index(&self, category: &str) -> &f64 {
        &self.scores[category]
    }
}

impl FromIterator<(String, f64)> for Scores {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Scores {
            scores: iter.into_iter().collect(),
        }
    }
}

/// Computes category scores for a query against a category store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityEngine {
    /// Additive smoothing constant.
    k: f64,
    /// Use `ln(1 / #categories)` as every category's prior.
    assume_uniform: bool,
}

impl ProbabilityEngine {
    /// Create a new engine.
    pub fn new(k: f64, assume_uniform: bool) -> Self {
        ProbabilityEngine { k, assume_uniform }
    }

    /// Create an engine from a classifier configuration.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.k, config.assume_uniform)
    }

    /// Raw log score of every category, in category name order.
    ///
    /// `vocab_size` is the smoothing support size `V`.
    pub fn log_scores<T, S>(
        &self,
        tokens: &[T],
        vocab_size: f64,
        store: &S,
    ) -> Result<Vec<(String, f64)>>
    where
        T: Token,
        S: CategoryStore<T> + ?Sized,
    {
        let categories = store.categories()?;
        if categories.is_empty() {
            return Ok(Vec::new());
        }

        let uniform_prior = (1.0 / categories.len() as f64).ln();
        let example_count = store.total_examples()? as f64;

        let mut raw = Vec::with_capacity(categories.len());
        for category in categories {
            let Some(summary) = store.summary(&category)? else {
                continue;
            };

            let prior = if self.assume_uniform {
                uniform_prior
            } else {
                (summary.examples as f64 / example_count).ln()
            };

            let denominator = summary.total_tokens as f64 + self.k * vocab_size;
            let mut log_probs = 0.0;
            for token in tokens {
                let count = store.count_of(&category, token)? as f64;
                log_probs += ((count + self.k) / denominator).ln();
            }
            raw.push((category, log_probs + prior));
        }
        Ok(raw)
    }

    /// Score a query: log scores followed by [`normalize`].
    pub fn calculate<T, S>(&self, tokens: &[T], vocab_size: f64, store: &S) -> Result<Scores>
    where
        T: Token,
        S: CategoryStore<T> + ?Sized,
    {
        normalize(self.log_scores(tokens, vocab_size, store)?)
    }
}

impl Default for ProbabilityEngine {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

/// Turn raw log scores into scores that sum to one.
///
/// Fails with [`NBayesError::DegenerateScore`] when a raw score is zero (a
/// probability of exactly one, e.g. an empty query against a single
/// category) or not finite, since neither can be divided into the sum.
pub fn normalize(raw: Vec<(String, f64)>) -> Result<Scores> {
    if let Some((category, value)) = raw
        .iter()
        .find(|(_, value)| *value == 0.0 || !value.is_finite())
    {
        return Err(NBayesError::degenerate_score(category.as_str(), *value));
    }

    let normalizer: f64 = raw.iter().map(|(_, value)| value).sum();

    let intermediate: Vec<(String, f64)> = raw
        .into_iter()
        .map(|(category, value)| (category, normalizer / value))
        .collect();
    let renormalizer: f64 = intermediate.iter().map(|(_, value)| value).sum();

    Ok(intermediate
        .into_iter()
        .map(|(category, value)| (category, value / renormalizer))
        .collect())
}
