//! The set of distinct tokens ever observed during training.
//!
//! The vocabulary supplies the support size `V` used in the Laplace smoothing
//! denominator `total_tokens + k * V`.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::token::Token;

/// Distinct tokens seen via training.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Token"))]
pub struct Vocabulary<T: Token> {
    tokens: AHashSet<T>,
}

impl<T: Token> Vocabulary<T> {
    /// Create a new empty vocabulary.
    pub fn new() -> Self {
        Vocabulary {
            tokens: AHashSet::new(),
        }
    }

    /// Mark a token as present. Idempotent; returns whether it was new.
    pub fn seen(&mut self, token: &T) -> bool {
        if self.tokens.contains(token) {
            return false;
        }
        self.tokens.insert(token.clone())
    }

    /// Remove a token; no-op if absent.
    pub fn delete(&mut self, token: &T) -> bool {
        self.tokens.remove(token)
    }

    /// Check if a token has been seen.
    pub fn contains(&self, token: &T) -> bool {
        self.tokens.contains(token)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Check if no token has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Smoothing support size.
    ///
    /// Returns the number of distinct tokens, or its natural logarithm when
    /// `log_scaled` is set. An empty vocabulary has size `0.0` in both modes,
    /// so `ln(0)` never leaks into the smoothing denominator.
    pub fn size(&self, log_scaled: bool) -> f64 {
        let count = self.tokens.len();
        if count == 0 {
            return 0.0;
        }
        if log_scaled {
            (count as f64).ln()
        } else {
            count as f64
        }
    }

    /// Iterate over all tokens. Order is not significant.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.tokens.iter()
    }
}

impl<T: Token> Default for Vocabulary<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> FromIterator<T> for Vocabulary<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Vocabulary {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl<T: Token> Extend<T> for Vocabulary<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.tokens.extend(iter);
    }
}
