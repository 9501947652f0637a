//! The classifier facade.
//!
//! [`Classifier`] ties a [`Vocabulary`], a [`CategoryStore`] and the
//! [`ProbabilityEngine`] together and exposes incremental training,
//! untraining, classification, pruning of rare tokens and category
//! management.
//!
//! # Example
//!
//! ```
//! use nbayes::Classifier;
//!
//! # fn main() -> nbayes::error::Result<()> {
//! let mut classifier: Classifier<String> = Classifier::new();
//! classifier.train(&["cheap".into(), "pills".into()], "spam")?;
//! classifier.train(&["meeting".into(), "notes".into()], "ham")?;
//!
//! let scores = classifier.classify(&["cheap".into()])?;
//! assert_eq!(scores.max(), Some("spam"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod persistence;
pub mod stats;

use std::borrow::Cow;

use tracing::debug;

use crate::error::Result;
use crate::probability::{ProbabilityEngine, Scores};
use crate::store::CategoryStore;
use crate::store::memory::MemoryStore;
use crate::token::{Token, dedup};
use crate::vocabulary::Vocabulary;

use self::config::{ClassifierConfig, validate_k};
use self::stats::CategoryStats;

/// Multinomial Naive Bayes classifier.
///
/// Generic over the token type and the category store. The default store is
/// [`MemoryStore`]; use [`Classifier::with_store`] to plug in another backend.
#[derive(Debug)]
pub struct Classifier<T: Token, S: CategoryStore<T> = MemoryStore<T>> {
    config: ClassifierConfig,
    vocab: Vocabulary<T>,
    store: S,
}

impl<T: Token> Classifier<T> {
    /// Create a new in-memory classifier with the default configuration.
    pub fn new() -> Self {
        Self::from_parts(ClassifierConfig::default(), Vocabulary::new(), MemoryStore::new())
    }

    /// Create a new in-memory classifier with the given configuration.
    pub fn with_config(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, Vocabulary::new(), MemoryStore::new()))
    }
}

impl<T: Token> Default for Classifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token, S: CategoryStore<T>> Classifier<T, S> {
    /// Create a classifier over an existing store.
    ///
    /// The vocabulary is read back from the store when it keeps one, and
    /// rebuilt from the distinct stored tokens otherwise.
    pub fn with_store(config: ClassifierConfig, store: S) -> Result<Self> {
        config.validate()?;
        let vocab: Vocabulary<T> = match store.vocabulary()? {
            Some(tokens) => tokens.into_iter().collect(),
            None => store.tokens()?.into_iter().collect(),
        };
        debug!(
            store = store.name(),
            vocab_size = vocab.len(),
            "attached category store"
        );
        Ok(Self::from_parts(config, vocab, store))
    }

    pub(crate) fn from_parts(config: ClassifierConfig, vocab: Vocabulary<T>, store: S) -> Self {
        Classifier {
            config,
            vocab,
            store,
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary<T> {
        &self.vocab
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the classifier and return its store.
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn k(&self) -> f64 {
        self.config.k
    }

    /// Set the smoothing constant. Must be finite and non-negative.
    pub fn set_k(&mut self, k: f64) -> Result<()> {
        validate_k(k)?;
        self.config.k = k;
        Ok(())
    }

    pub fn is_binarized(&self) -> bool {
        self.config.binarized
    }

    pub fn set_assume_uniform(&mut self, assume_uniform: bool) {
        self.config.assume_uniform = assume_uniform;
    }

    pub fn set_log_vocab(&mut self, log_vocab: bool) {
        self.config.log_vocab = log_vocab;
    }

    /// Smoothing support size of the current vocabulary.
    pub fn vocab_size(&self) -> f64 {
        self.vocab.size(self.config.log_vocab)
    }

    /// Names of the trained categories, in ascending order.
    pub fn categories(&self) -> Result<Vec<String>> {
        self.store.categories()
    }

    /// Total number of training examples.
    pub fn total_examples(&self) -> Result<u64> {
        self.store.total_examples()
    }

    fn prepare<'a>(&self, tokens: &'a [T]) -> Cow<'a, [T]> {
        if self.config.binarized {
            Cow::Owned(dedup(tokens))
        } else {
            Cow::Borrowed(tokens)
        }
    }

    fn forget(&mut self, token: &T) -> Result<()> {
        if self.vocab.delete(token) {
            self.store.remove_vocabulary(token)?;
        }
        Ok(())
    }

    /// Train one example.
    pub fn train(&mut self, tokens: &[T], category: &str) -> Result<()> {
        let tokens = self.prepare(tokens);
        self.store.increment_examples(category)?;
        for token in tokens.iter() {
            if self.vocab.seen(token) {
                self.store.add_vocabulary(token)?;
            }
            self.store.add_token(category, token)?;
        }
        debug!(category, tokens = tokens.len(), "trained example");
        Ok(())
    }

    /// Shorthand for training into the `"ham"` category.
    pub fn ham(&mut self, tokens: &[T]) -> Result<()> {
        self.train(tokens, "ham")
    }

    /// Shorthand for training into the `"spam"` category.
    pub fn spam(&mut self, tokens: &[T]) -> Result<()> {
        self.train(tokens, "spam")
    }

    /// Undo one training example.
    ///
    /// Which tokens the category records is read before the example count
    /// is decremented, so untraining a category's last example still drops
    /// its tokens from the vocabulary after the category itself is gone.
    /// Tokens never trained into the category are skipped.
    pub fn untrain(&mut self, tokens: &[T], category: &str) -> Result<()> {
        let tokens = self.prepare(tokens);
        let trained = tokens
            .iter()
            .map(|token| self.store.token_trained(token, category))
            .collect::<Result<Vec<_>>>()?;
        self.store.decrement_examples(category)?;

        let mut removed = 0;
        for (token, trained) in tokens.iter().zip(trained) {
            if !trained {
                continue;
            }
            // Drops the token from the shared vocabulary even when other
            // categories still count it.
            self.forget(token)?;
            self.store.remove_token(category, token)?;
            removed += 1;
        }
        debug!(category, tokens = tokens.len(), removed, "untrained example");
        Ok(())
    }

    /// Score every category for a query.
    pub fn classify(&self, tokens: &[T]) -> Result<Scores> {
        let tokens = self.prepare(tokens);
        debug!(tokens = ?tokens, "classify");

        let engine = ProbabilityEngine::from_config(&self.config);
        let scores = engine.calculate(&*tokens, self.vocab_size(), &self.store)?;

        debug!(results = ?scores, "classify results");
        Ok(scores)
    }

    /// Remove tokens whose frequency summed across categories is below `threshold`.
    ///
    /// Purged tokens leave both the store and the vocabulary. Example counts
    /// are not touched, so purging is not always the same as never having
    /// trained the token. Returns the number of purged tokens.
    pub fn purge_less_than(&mut self, threshold: u64) -> Result<usize> {
        let candidates: Vec<T> = self.vocab.iter().cloned().collect();
        let mut purged = 0;
        for token in candidates {
            if self.store.purge_less_than(&token, threshold)? {
                self.forget(&token)?;
                purged += 1;
            }
        }
        debug!(threshold, purged, vocab_size = self.vocab.len(), "purged rare tokens");
        Ok(purged)
    }

    /// Delete a category and return the remaining category names.
    pub fn delete_category(&mut self, category: &str) -> Result<Vec<String>> {
        self.store.delete_category(category)
    }

    /// Structured per-category statistics.
    pub fn stats(&self) -> Result<Vec<CategoryStats>> {
        stats::collect::<T, S>(&self.store)
    }

    /// Human-readable per-category statistics, one line per category.
    pub fn category_stats(&self) -> Result<String> {
        Ok(stats::render(&self.stats()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::{SqliteStore, SqliteStoreConfig};

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_train_counts_examples_once() {
        let mut classifier = Classifier::<String>::new();
        classifier.train(&tokens("a a b"), "classA").unwrap();

        let record = classifier.store().get("classA").unwrap();
        assert_eq!(record.examples, 1);
        assert_eq!(record.total_tokens, 3);
        assert_eq!(record.count_of(&"a".to_string()), 2);
        assert_eq!(classifier.vocabulary().len(), 2);
    }

    #[test]
    fn test_binarized_train_dedups() {
        let config = ClassifierConfig::default().with_binarized(true);
        let mut classifier = Classifier::<String>::with_config(config).unwrap();
        classifier.train(&tokens("a a a b"), "classA").unwrap();
        classifier.train(&tokens("a"), "classA").unwrap();

        let record = classifier.store().get("classA").unwrap();
        assert_eq!(record.count_of(&"a".to_string()), 2);
        assert_eq!(record.total_tokens, 3);
        assert!(classifier.is_binarized());
    }

    #[test]
    fn test_untrain_removes_tokens_and_vocabulary() {
        let mut classifier = Classifier::<String>::new();
        classifier.train(&tokens("a b"), "classA").unwrap();
        classifier.train(&tokens("a c"), "classA").unwrap();
        classifier.train(&tokens("a"), "classB").unwrap();

        classifier.untrain(&tokens("a c"), "classA").unwrap();

        let record = classifier.store().get("classA").unwrap();
        assert_eq!(record.examples, 1);
        assert_eq!(record.count_of(&"a".to_string()), 1);
        assert_eq!(record.count_of(&"c".to_string()), 0);
        // 'a' leaves the vocabulary although classB still counts it
        assert!(!classifier.vocabulary().contains(&"a".to_string()));
        assert!(classifier.vocabulary().contains(&"b".to_string()));
    }

    #[test]
    fn test_untrain_last_example_deletes_category() {
        let mut classifier = Classifier::<String>::new();
        classifier.train(&tokens("a b"), "classA").unwrap();
        classifier.untrain(&tokens("a b"), "classA").unwrap();

        assert!(classifier.categories().unwrap().is_empty());
        assert!(classifier.vocabulary().is_empty());
    }

    #[test]
    fn test_untrain_last_example_shrinks_vocabulary_for_others() {
        let mut classifier = Classifier::<String>::new();
        classifier.train(&tokens("a b"), "classA").unwrap();
        classifier.train(&tokens("x"), "classB").unwrap();
        classifier.train(&tokens("y"), "classC").unwrap();
        classifier.untrain(&tokens("a b"), "classA").unwrap();

        assert_eq!(classifier.categories().unwrap(), vec!["classB", "classC"]);
        assert_eq!(classifier.vocabulary().len(), 2);
        assert!(!classifier.vocabulary().contains(&"a".to_string()));

        let mut fresh = Classifier::<String>::new();
        fresh.train(&tokens("x"), "classB").unwrap();
        fresh.train(&tokens("y"), "classC").unwrap();
        assert_eq!(
            classifier.classify(&tokens("x")).unwrap(),
            fresh.classify(&tokens("x")).unwrap()
        );
    }

    #[test]
    fn test_untrain_unknown_category_is_noop() {
        let mut classifier = Classifier::<String>::new();
        classifier.train(&tokens("a b"), "classA").unwrap();
        classifier.untrain(&tokens("a b"), "classC").unwrap();

        assert_eq!(classifier.categories().unwrap(), vec!["classA"]);
        assert_eq!(classifier.vocabulary().len(), 2);
    }

    #[test]
    fn test_set_k_validates() {
        let mut classifier = Classifier::<String>::new();
        assert!(classifier.set_k(-0.5).is_err());
        assert_eq!(classifier.k(), 1.0);
        classifier.set_k(5.0).unwrap();
        assert_eq!(classifier.k(), 5.0);
    }

    #[test]
    fn test_with_config_rejects_invalid_k() {
        let config = ClassifierConfig::default().with_k(f64::NAN);
        assert!(Classifier::<String>::with_config(config).is_err());
    }

    #[test]
    fn test_classify_without_categories() {
        let classifier = Classifier::<String>::new();
        assert!(classifier.classify(&tokens("a")).unwrap().is_empty());
    }

    #[test]
    fn test_classify_empty_query_single_category_is_degenerate() {
        let mut classifier = Classifier::<String>::new();
        classifier.train(&tokens("a"), "classA").unwrap();
        assert!(classifier.classify(&[]).is_err());
    }

    #[test]
    fn test_ham_and_spam() {
        let mut classifier = Classifier::<String>::new();
        classifier.ham(&tokens("lunch at noon")).unwrap();
        classifier.spam(&tokens("cheap pills now")).unwrap();

        assert_eq!(classifier.categories().unwrap(), vec!["ham", "spam"]);
        let scores = classifier.classify(&tokens("cheap pills")).unwrap();
        assert_eq!(scores.max(), Some("spam"));
    }

    #[test]
    fn test_category_stats() {
        let mut classifier = Classifier::<String>::new();
        classifier.train(&tokens("a a a a"), "classA").unwrap();
        classifier.train(&tokens("b b"), "classB").unwrap();

        assert_eq!(
            classifier.category_stats().unwrap(),
            "For category classA, 1 examples (50.00% of the total) and 4 total_tokens\n\
             For category classB, 1 examples (50.00% of the total) and 2 total_tokens"
        );
    }

    #[test]
    fn test_with_store_rebuilds_vocabulary() {
        let mut store: MemoryStore<String> = MemoryStore::new();
        store.increment_examples("classA").unwrap();
        store.add_token("classA", &"a".to_string()).unwrap();
        store.add_token("classA", &"b".to_string()).unwrap();

        let classifier = Classifier::with_store(ClassifierConfig::default(), store).unwrap();
        assert_eq!(classifier.vocabulary().len(), 2);
        assert_eq!(classifier.total_examples().unwrap(), 1);
    }

    #[test]
    fn test_with_store_reads_saved_vocabulary() {
        let store: SqliteStore<String> = SqliteStore::open(SqliteStoreConfig::in_memory()).unwrap();
        let mut classifier = Classifier::with_store(ClassifierConfig::default(), store).unwrap();
        classifier.train(&tokens("a b"), "classA").unwrap();
        classifier.train(&tokens("a b"), "classA").unwrap();
        classifier.train(&tokens("a"), "classB").unwrap();
        classifier.untrain(&tokens("b"), "classA").unwrap();
        assert_eq!(classifier.store().count_of("classA", &"b".to_string()).unwrap(), 1);

        let expected = classifier.classify(&tokens("a b")).unwrap();
        let reattached =
            Classifier::with_store(ClassifierConfig::default(), classifier.into_store()).unwrap();
        assert_eq!(reattached.vocabulary().len(), 1);
        assert!(reattached.vocabulary().contains(&"a".to_string()));
        assert_eq!(reattached.classify(&tokens("a b")).unwrap(), expected);
    }
}
