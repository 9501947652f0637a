//! # NBayes
//!
//! A multinomial Naive Bayes classifier for arbitrary token types.
//!
//! ## Features
//!
//! - Incremental training and untraining
//! - Laplace smoothing with a configurable constant
//! - Binarized (presence-only) counting
//! - Uniform or example-weighted priors
//! - Pruning of rare tokens
//! - Pluggable category stores (in-memory, SQLite)
//! - YAML snapshots
//!
//! ## Example
//!
//! ```
//! use nbayes::{Classifier, ClassifierConfig};
//!
//! # fn main() -> nbayes::error::Result<()> {
//! let config = ClassifierConfig::default().with_binarized(true);
//! let mut classifier = Classifier::<String>::with_config(config)?;
//!
//! classifier.train(&["a".into(), "b".into(), "c".into()], "classA")?;
//! classifier.train(&["b".into(), "c".into(), "d".into()], "classB")?;
//!
//! let scores = classifier.classify(&["a".into(), "b".into()])?;
//! assert_eq!(scores.max(), Some("classA"));
//! assert!((scores.total() - 1.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod error;
pub mod probability;
pub mod store;
pub mod sync;
pub mod token;
pub mod vocabulary;

pub use classifier::Classifier;
pub use classifier::config::ClassifierConfig;
pub use classifier::stats::CategoryStats;
pub use error::{NBayesError, Result};
pub use probability::{ProbabilityEngine, Scores};
pub use store::memory::MemoryStore;
pub use store::sqlite::{SqliteStore, SqliteStoreConfig};
pub use store::{CategoryStore, StoreConfig, StoreFactory};
pub use sync::SharedClassifier;
pub use token::Token;
pub use vocabulary::Vocabulary;

pub mod prelude {
    pub use crate::{
        CategoryStore, Classifier, ClassifierConfig, NBayesError, Result, Scores, Token,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
