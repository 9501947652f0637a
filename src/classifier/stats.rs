//! Per-category training statistics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::CategoryStore;
use crate::token::Token;

/// Training statistics of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub examples: u64,
    /// Percentage of all training examples.
    pub share: f64,
    pub total_tokens: u64,
}

impl fmt::Display for CategoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "For category {}, {} examples ({:.2}% of the total) and {} total_tokens",
            self.category, self.examples, self.share, self.total_tokens
        )
    }
}

/// Collect statistics for every category of a store.
pub fn collect<T, S>(store: &S) -> Result<Vec<CategoryStats>>
where
    T: Token,
    S: CategoryStore<T> + ?Sized,
{
    let total_examples = store.total_examples()?;
    let mut stats = Vec::new();
    for category in store.categories()? {
        let Some(summary) = store.summary(&category)? else {
            continue;
        };
        let share = if total_examples == 0 {
            0.0
        } else {
            100.0 * summary.examples as f64 / total_examples as f64
        };
        stats.push(CategoryStats {
            category,
            examples: summary.examples,
            share,
            total_tokens: summary.total_tokens,
        });
    }
    Ok(stats)
}

/// Render statistics one category per line.
pub fn render(stats: &[CategoryStats]) -> String {
    stats
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
