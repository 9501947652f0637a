//! Category storage layer for the classifier.
//!
//! This module defines the storage collaborator the classifier talks to for
//! per-category accounting. Backends can be swapped without touching the
//! classifier facade or the probability engine.
//!
//! # Architecture
//!
//! - **CategoryStore trait**: Unified interface for all category backends
//! - **StoreConfig enum**: Type-safe configuration for supported backends
//! - **StoreFactory**: Helper for constructing concrete store instances
//!
//! # Store Types
//!
//! ## MemoryStore
//! - Owned maps, the default backend
//! - Serialized as part of classifier snapshots
//!
//! ## SqliteStore
//! - `categories` and `tokens` tables in a SQLite database
//! - Example counts and the vocabulary are kept in storage, so a reopened
//!   database classifies exactly as before
//!
//! # Example
//!
//! ```
//! use nbayes::store::{CategoryStore, StoreConfig, StoreFactory};
//! use nbayes::store::sqlite::SqliteStoreConfig;
//!
//! # fn main() -> nbayes::error::Result<()> {
//! let mut store = StoreFactory::create::<String>(StoreConfig::Memory)?;
//! store.increment_examples("spam")?;
//! store.add_token("spam", &"viagra".to_string())?;
//! assert_eq!(store.count_of("spam", &"viagra".to_string())?, 1);
//!
//! let store = StoreFactory::create::<String>(StoreConfig::Sqlite(SqliteStoreConfig::in_memory()))?;
//! assert!(store.categories()?.is_empty());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fmt::Debug;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::token::Token;

pub mod memory;
pub mod sqlite;

/// Aggregate state of one category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Token"))]
pub struct CategoryRecord<T: Token> {
    /// Token frequencies.
    pub tokens: AHashMap<T, u64>,

    /// Sum of all token frequencies.
    pub total_tokens: u64,

    /// Number of training calls attributed to this category.
    pub examples: u64,
}

impl<T: Token> CategoryRecord<T> {
    /// Create a new zeroed record.
    pub fn new() -> Self {
        CategoryRecord {
            tokens: AHashMap::new(),
            total_tokens: 0,
            examples: 0,
        }
    }

    /// Frequency of a token, 0 if absent.
    pub fn count_of(&self, token: &T) -> u64 {
        self.tokens.get(token).copied().unwrap_or(0)
    }
}

impl<T: Token> Default for CategoryRecord<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Example and token totals of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySummary {
    pub examples: u64,
    pub total_tokens: u64,
}

/// A trait for backends that hold per-category token accounting.
///
/// Every method returns a [`Result`] so that durable backends can surface
/// I/O failures. The in-memory backend never fails.
///
/// Category names are always reported in ascending order.
pub trait CategoryStore<T: Token>: Send + Debug {
    /// Names of the categories currently present.
    fn categories(&self) -> Result<Vec<String>>;

    /// Check if a category exists.
    fn has_category(&self, category: &str) -> Result<bool>;

    /// Example and token totals of a category, `None` if absent.
    fn summary(&self, category: &str) -> Result<Option<CategorySummary>>;

    /// Add one training example to a category, creating it if needed.
    fn increment_examples(&mut self, category: &str) -> Result<()>;

    /// Remove one training example; the category is deleted when no example is left.
    ///
    /// A no-op for an absent category.
    fn decrement_examples(&mut self, category: &str) -> Result<()>;

    /// Increment a token's frequency in a category, creating entries as needed.
    fn add_token(&mut self, category: &str, token: &T) -> Result<()>;

    /// Decrement a token's frequency in a category.
    ///
    /// The token entry is dropped once its frequency falls below 1 and the
    /// category is dropped once its total token count falls below 1. A no-op
    /// when the category or the token is absent.
    fn remove_token(&mut self, category: &str, token: &T) -> Result<()>;

    /// Check if a token has a recorded frequency in a category.
    fn token_trained(&self, token: &T, category: &str) -> Result<bool>;

    /// Frequency of a token in a category, 0 if either is absent.
    fn count_of(&self, category: &str, token: &T) -> Result<u64>;

    /// Remove a token from every category if its summed frequency is below `threshold`.
    ///
    /// Categories whose total token count falls to zero are deleted. Returns
    /// whether the token was removed.
    fn purge_less_than(&mut self, token: &T, threshold: u64) -> Result<bool>;

    /// Delete a category if present and return the remaining category names.
    fn delete_category(&mut self, category: &str) -> Result<Vec<String>>;

    /// Sum of examples across all categories.
    fn total_examples(&self) -> Result<u64>;

    /// Distinct tokens recorded in any category.
    fn tokens(&self) -> Result<Vec<T>>;

    /// Export every category record.
    fn records(&self) -> Result<BTreeMap<String, CategoryRecord<T>>>;

    /// Vocabulary saved by the backend, `None` when it does not keep one.
    ///
    /// After an untrain the vocabulary can differ from the set of stored
    /// tokens, so durable backends keep it next to the counts.
    fn vocabulary(&self) -> Result<Option<Vec<T>>> {
        Ok(None)
    }

    /// Record a token entering the vocabulary.
    fn add_vocabulary(&mut self, _token: &T) -> Result<()> {
        Ok(())
    }

    /// Record a token leaving the vocabulary.
    fn remove_vocabulary(&mut self, _token: &T) -> Result<()> {
        Ok(())
    }

    /// Get the name of this backend for debugging and logging.
    fn name(&self) -> &str;
}

impl<T: Token, S: CategoryStore<T> + ?Sized> CategoryStore<T> for Box<S> {
    fn categories(&self) -> Result<Vec<String>> {
        (**self).categories()
    }

    fn has_category(&self, category: &str) -> Result<bool> {
        (**self).has_category(category)
    }

    fn summary(&self, category: &str) -> Result<Option<CategorySummary>> {
        (**self).summary(category)
    }

    fn increment_examples(&mut self, category: &str) -> Result<()> {
        (**self).increment_examples(category)
    }

    fn decrement_examples(&mut self, category: &str) -> Result<()> {
        (**self).decrement_examples(category)
    }

    fn add_token(&mut self, category: &str, token: &T) -> Result<()> {
        (**self).add_token(category, token)
    }

    fn remove_token(&mut self, category: &str, token: &T) -> Result<()> {
        (**self).remove_token(category, token)
    }

    fn token_trained(&self, token: &T, category: &str) -> Result<bool> {
        (**self).token_trained(token, category)
    }

    fn count_of(&self, category: &str, token: &T) -> Result<u64> {
        (**self).count_of(category, token)
    }

    fn purge_less_than(&mut self, token: &T, threshold: u64) -> Result<bool> {
        (**self).purge_less_than(token, threshold)
    }

    fn delete_category(&mut self, category: &str) -> Result<Vec<String>> {
        (**self).delete_category(category)
    }

    fn total_examples(&self) -> Result<u64> {
        (**self).total_examples()
    }

    fn tokens(&self) -> Result<Vec<T>> {
        (**self).tokens()
    }

    fn records(&self) -> Result<BTreeMap<String, CategoryRecord<T>>> {
        (**self).records()
    }

    fn vocabulary(&self) -> Result<Option<Vec<T>>> {
        (**self).vocabulary()
    }

    fn add_vocabulary(&mut self, token: &T) -> Result<()> {
        (**self).add_vocabulary(token)
    }

    fn remove_vocabulary(&mut self, token: &T) -> Result<()> {
        (**self).remove_vocabulary(token)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Configuration for the category store backend.
///
/// Each variant carries the settings specific to that backend, including the
/// database path for the SQLite store.
#[derive(Debug, Clone, Default)]
pub enum StoreConfig {
    /// In-memory maps
    #[default]
    Memory,

    /// SQLite-backed store
    Sqlite(sqlite::SqliteStoreConfig),
}

/// A factory for creating category stores from a [`StoreConfig`].
pub struct StoreFactory;

impl StoreFactory {
    /// Create a new store instance with the given configuration.
    pub fn create<T: Token>(config: StoreConfig) -> Result<Box<dyn CategoryStore<T>>> {
        match config {
            StoreConfig::Memory => Ok(Box::new(memory::MemoryStore::new())),
            StoreConfig::Sqlite(sqlite_config) => {
                let store = sqlite::SqliteStore::open(sqlite_config)?;
                Ok(Box::new(store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStoreConfig;

    fn exercise(store: &mut dyn CategoryStore<String>) {
        let a = "a".to_string();
        store.increment_examples("classA").unwrap();
        store.add_token("classA", &a).unwrap();
        store.add_token("classA", &a).unwrap();

        assert_eq!(store.categories().unwrap(), vec!["classA"]);
        assert_eq!(store.count_of("classA", &a).unwrap(), 2);
        assert_eq!(
            store.summary("classA").unwrap(),
            Some(CategorySummary {
                examples: 1,
                total_tokens: 2
            })
        );
    }

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();

        // Default is Memory
        match config {
            StoreConfig::Memory => {}
            _ => panic!("Expected Memory config"),
        }
    }

    #[test]
    fn test_factory_memory_store() {
        let mut store = StoreFactory::create::<String>(StoreConfig::Memory).unwrap();
        assert_eq!(store.name(), "memory");
        exercise(store.as_mut());
    }

    #[test]
    fn test_factory_sqlite_store() {
        let config = StoreConfig::Sqlite(SqliteStoreConfig::in_memory());
        let mut store = StoreFactory::create::<String>(config).unwrap();
        assert_eq!(store.name(), "sqlite");
        exercise(store.as_mut());
    }

    #[test]
    fn test_record_count_of() {
        let mut record = CategoryRecord::new();
        record.tokens.insert(7_u32, 3);
        record.total_tokens = 3;

        assert_eq!(record.count_of(&7), 3);
        assert_eq!(record.count_of(&8), 0);
    }
}
