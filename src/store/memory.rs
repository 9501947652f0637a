//! In-memory category store.

use std::collections::BTreeMap;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::store::{CategoryRecord, CategoryStore, CategorySummary};
use crate::token::Token;

/// Category records held in owned maps.
///
/// This is the default backend and the one carried inside classifier
/// snapshots. Categories are kept in a `BTreeMap`, so iteration order is the
/// ascending name order every [`CategoryStore`] reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent, bound(deserialize = "T: Token"))]
pub struct MemoryStore<T: Token> {
    data: BTreeMap<String, CategoryRecord<T>>,
}

impl<T: Token> MemoryStore<T> {
    /// Create a new empty store.
    pub fn new() -> Self {
        MemoryStore {
            data: BTreeMap::new(),
        }
    }

    /// Build a store from exported records and re-establish its invariants.
    ///
    /// Imported data may come from a hand-edited or older snapshot, so zero
    /// frequencies are dropped, totals are recomputed from the token tables
    /// and categories without examples are removed. Returns the store and the
    /// number of repairs applied.
    pub fn from_records(records: BTreeMap<String, CategoryRecord<T>>) -> (Self, usize) {
        let mut store = MemoryStore { data: records };
        let repairs = store.reset_after_import();
        (store, repairs)
    }

    /// Get the record of a category, creating a zeroed one if absent.
    pub fn ensure(&mut self, category: &str) -> &mut CategoryRecord<T> {
        self.data.entry(category.to_string()).or_default()
    }

    /// Get the record of a category.
    pub fn get(&self, category: &str) -> Option<&CategoryRecord<T>> {
        self.data.get(category)
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the store holds no category.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn reset_after_import(&mut self) -> usize {
        let mut repairs = 0;

        for (category, record) in self.data.iter_mut() {
            let before = record.tokens.len();
            record.tokens.retain(|_, count| *count > 0);
            if record.tokens.len() != before {
                warn!(category = %category, dropped = before - record.tokens.len(), "dropped zero-frequency tokens");
                repairs += 1;
            }

            let total: u64 = record.tokens.values().sum();
            if total != record.total_tokens {
                warn!(
                    category = %category,
                    stored = record.total_tokens,
                    actual = total,
                    "recomputed total_tokens"
                );
                record.total_tokens = total;
                repairs += 1;
            }
        }

        let before = self.data.len();
        self.data.retain(|category, record| {
            if record.examples == 0 {
                warn!(category = %category, "dropped category without examples");
                false
            } else {
                true
            }
        });
        repairs + (before - self.data.len())
    }
}

impl<T: Token> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Token> CategoryStore<T> for MemoryStore<T> {
    fn categories(&self) -> Result<Vec<String>> {
        Ok(self.data.keys().cloned().collect())
    }

    fn has_category(&self, category: &str) -> Result<bool> {
        Ok(self.data.contains_key(category))
    }

    fn summary(&self, category: &str) -> Result<Option<CategorySummary>> {
        Ok(self.data.get(category).map(|record| CategorySummary {
            examples: record.examples,
            total_tokens: record.total_tokens,
        }))
    }

    fn increment_examples(&mut self, category: &str) -> Result<()> {
        self.ensure(category).examples += 1;
        Ok(())
    }

    fn decrement_examples(&mut self, category: &str) -> Result<()> {
        let Some(record) = self.data.get_mut(category) else {
            return Ok(());
        };
        record.examples = record.examples.saturating_sub(1);
        if record.examples < 1 {
            self.data.remove(category);
        }
        Ok(())
    }

    fn add_token(&mut self, category: &str, token: &T) -> Result<()> {
        let record = self.ensure(category);
        *record.tokens.entry(token.clone()).or_insert(0) += 1;
        record.total_tokens += 1;
        Ok(())
    }

    fn remove_token(&mut self, category: &str, token: &T) -> Result<()> {
        let Some(record) = self.data.get_mut(category) else {
            return Ok(());
        };
        let Some(count) = record.tokens.get_mut(token) else {
            return Ok(());
        };

        *count -= 1;
        if *count < 1 {
            record.tokens.remove(token);
        }
        record.total_tokens = record.total_tokens.saturating_sub(1);
        if record.total_tokens < 1 {
            self.data.remove(category);
        }
        Ok(())
    }

    fn token_trained(&self, token: &T, category: &str) -> Result<bool> {
        Ok(self
            .data
            .get(category)
            .is_some_and(|record| record.tokens.contains_key(token)))
    }

    fn count_of(&self, category: &str, token: &T) -> Result<u64> {
        Ok(self
            .data
            .get(category)
            .map_or(0, |record| record.count_of(token)))
    }

    fn purge_less_than(&mut self, token: &T, threshold: u64) -> Result<bool> {
        let total: u64 = self.data.values().map(|record| record.count_of(token)).sum();
        if total >= threshold {
            return Ok(false);
        }

        self.data.retain(|_, record| match record.tokens.remove(token) {
            Some(count) => {
                record.total_tokens = record.total_tokens.saturating_sub(count);
                record.total_tokens > 0
            }
            None => true,
        });
        Ok(true)
    }

    fn delete_category(&mut self, category: &str) -> Result<Vec<String>> {
        self.data.remove(category);
        self.categories()
    }

    fn total_examples(&self) -> Result<u64> {
        Ok(self.data.values().map(|record| record.examples).sum())
    }

    fn tokens(&self) -> Result<Vec<T>> {
        let mut seen = AHashSet::new();
        Ok(self
            .data
            .values()
            .flat_map(|record| record.tokens.keys())
            .filter(|token| seen.insert(*token))
            .cloned()
            .collect())
    }

    fn records(&self) -> Result<BTreeMap<String, CategoryRecord<T>>> {
        Ok(self.data.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_ensure_creates_zeroed_record() {
        let mut store: MemoryStore<String> = MemoryStore::new();
        let record = store.ensure("classA");
        assert_eq!(record.examples, 0);
        assert_eq!(record.total_tokens, 0);
        assert!(record.tokens.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_and_count() {
        let mut store = MemoryStore::new();
        store.increment_examples("classA").unwrap();
        store.add_token("classA", &token("a")).unwrap();
        store.add_token("classA", &token("a")).unwrap();
        store.add_token("classA", &token("b")).unwrap();

        let record = store.get("classA").unwrap();
        assert_eq!(record.total_tokens, 3);
        assert_eq!(record.examples, 1);
        assert_eq!(store.count_of("classA", &token("a")).unwrap(), 2);
        assert_eq!(store.count_of("classA", &token("z")).unwrap(), 0);
        assert_eq!(store.count_of("classZ", &token("a")).unwrap(), 0);
        assert!(store.token_trained(&token("b"), "classA").unwrap());
        assert!(!store.token_trained(&token("b"), "classZ").unwrap());
    }

    #[test]
    fn test_decrement_examples_deletes_category() {
        let mut store = MemoryStore::new();
        store.increment_examples("classA").unwrap();
        store.increment_examples("classA").unwrap();
        store.add_token("classA", &token("a")).unwrap();

        store.decrement_examples("classA").unwrap();
        assert!(store.has_category("classA").unwrap());

        store.decrement_examples("classA").unwrap();
        assert!(!store.has_category("classA").unwrap());

        // absent category is a no-op
        store.decrement_examples("classB").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_token() {
        let mut store = MemoryStore::new();
        store.increment_examples("classA").unwrap();
        store.add_token("classA", &token("a")).unwrap();
        store.add_token("classA", &token("a")).unwrap();
        store.add_token("classA", &token("b")).unwrap();

        store.remove_token("classA", &token("a")).unwrap();
        assert_eq!(store.count_of("classA", &token("a")).unwrap(), 1);
        assert_eq!(store.get("classA").unwrap().total_tokens, 2);

        store.remove_token("classA", &token("b")).unwrap();
        assert!(!store.token_trained(&token("b"), "classA").unwrap());

        store.remove_token("classA", &token("missing")).unwrap();
        assert_eq!(store.get("classA").unwrap().total_tokens, 1);

        store.remove_token("classA", &token("a")).unwrap();
        assert!(!store.has_category("classA").unwrap());
    }

    #[test]
    fn test_purge_less_than() {
        let mut store = MemoryStore::new();
        store.increment_examples("classA").unwrap();
        store.increment_examples("classB").unwrap();
        store.add_token("classA", &token("a")).unwrap();
        store.add_token("classA", &token("a")).unwrap();
        store.add_token("classA", &token("c")).unwrap();
        store.add_token("classB", &token("c")).unwrap();

        // 'c' sums to 2 across categories
        assert!(!store.purge_less_than(&token("c"), 2).unwrap());
        assert_eq!(store.count_of("classB", &token("c")).unwrap(), 1);

        assert!(store.purge_less_than(&token("c"), 3).unwrap());
        assert_eq!(store.count_of("classA", &token("c")).unwrap(), 0);
        assert_eq!(store.get("classA").unwrap().total_tokens, 2);

        // classB only held 'c'
        assert_eq!(store.categories().unwrap(), vec!["classA"]);
    }

    #[test]
    fn test_delete_category() {
        let mut store: MemoryStore<String> = MemoryStore::new();
        store.increment_examples("classA").unwrap();
        store.increment_examples("classB").unwrap();

        assert_eq!(store.delete_category("classB").unwrap(), vec!["classA"]);
        assert_eq!(store.delete_category("classB").unwrap(), vec!["classA"]);
        assert_eq!(store.total_examples().unwrap(), 1);
    }

    #[test]
    fn test_tokens_are_distinct() {
        let mut store = MemoryStore::new();
        store.increment_examples("classA").unwrap();
        store.increment_examples("classB").unwrap();
        store.add_token("classA", &1_u32).unwrap();
        store.add_token("classB", &1_u32).unwrap();
        store.add_token("classB", &2_u32).unwrap();

        let mut tokens = store.tokens().unwrap();
        tokens.sort();
        assert_eq!(tokens, vec![1, 2]);
    }

    #[test]
    fn test_from_records_repairs_invariants() {
        let mut broken = CategoryRecord::new();
        broken.tokens.insert(token("a"), 3);
        broken.tokens.insert(token("b"), 0);
        broken.total_tokens = 10;
        broken.examples = 2;

        let mut empty = CategoryRecord::new();
        empty.tokens.insert(token("c"), 1);
        empty.total_tokens = 1;

        let mut records = BTreeMap::new();
        records.insert("classA".to_string(), broken);
        records.insert("classB".to_string(), empty);

        let (store, repairs) = MemoryStore::from_records(records);
        assert_eq!(repairs, 3);
        assert_eq!(store.categories().unwrap(), vec!["classA"]);

        let record = store.get("classA").unwrap();
        assert_eq!(record.total_tokens, 3);
        assert!(!record.tokens.contains_key("b"));
    }
}
