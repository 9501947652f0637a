//! Classifier configuration.

use serde::{Deserialize, Serialize};

use crate::error::{NBayesError, Result};

/// Configuration for a [`Classifier`](crate::classifier::Classifier).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Additive (Laplace) smoothing constant. Must be finite and non-negative.
    pub k: f64,
    /// Count each token at most once per training or query call.
    pub binarized: bool,
    /// Give every category the same prior instead of its share of examples.
    pub assume_uniform: bool,
    /// Smooth with the natural log of the vocabulary size.
    pub log_vocab: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            k: 1.0,
            binarized: false,
            assume_uniform: false,
            log_vocab: false,
        }
    }
}

impl ClassifierConfig {
    pub fn with_k(mut self, k: f64) -> Self {
        self.k = k;
        self
    }

    pub fn with_binarized(mut self, binarized: bool) -> Self {
        self.binarized = binarized;
        self
    }

    pub fn with_assume_uniform(mut self, assume_uniform: bool) -> Self {
        self.assume_uniform = assume_uniform;
        self
    }

    pub fn with_log_vocab(mut self, log_vocab: bool) -> Self {
        self.log_vocab = log_vocab;
        self
    }

    /// Check the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_k(self.k)
    }
}

pub(crate) fn validate_k(k: f64) -> Result<()> {
    if !k.is_finite() || k < 0.0 {
        return Err(NBayesError::invalid_config(format!(
            "smoothing constant k must be finite and non-negative, got {k}"
        )));
    }
    Ok(())
}
