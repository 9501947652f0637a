//! Token trait shared by the vocabulary, the stores and the classifier.

use std::fmt::Debug;
use std::hash::Hash;

use ahash::AHashSet;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// An opaque value that can be counted and classified.
///
/// Tokens are used as map keys, so equality and hashing must be total and
/// consistent. They need not be text: integers, tuples or any serde-encodable
/// key type works.
pub trait Token:
    Clone + Eq + Hash + Debug + Send + Sync + 'static + Serialize + DeserializeOwned
{
}

impl<T> Token for T where
    T: Clone + Eq + Hash + Debug + Send + Sync + 'static + Serialize + DeserializeOwned
{
}

/// Collapse a token multiset into a set, keeping first-occurrence order.
pub fn dedup<T: Token>(tokens: &[T]) -> Vec<T> {
    let mut seen = AHashSet::with_capacity(tokens.len());
    tokens
        .iter()
        .filter(|token| seen.insert(*token))
        .cloned()
        .collect()
}
