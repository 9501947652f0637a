//! Error types for the nbayes library.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! the [`NBayesError`] enum. Storage backends, snapshot parsing and the
//! probability engine all report through it.
//!
//! # Examples
//!
//! ```
//! use nbayes::error::{NBayesError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(NBayesError::invalid_config("k must be non-negative"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for nbayes operations.
#[derive(Error, Debug)]
pub enum NBayesError {
    /// I/O errors (snapshot files, database files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid classifier or store configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Storage backend errors that are not plain SQLite errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite errors from the durable store
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Malformed or inconsistent snapshot content
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// YAML serialization/deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization errors (token encoding)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A category's log score cannot take part in the renormalization
    #[error("Degenerate score for category '{category}': raw log score is {raw}")]
    DegenerateScore { category: String, raw: f64 },
}

/// Result type alias for operations that may fail with NBayesError.
pub type Result<T> = std::result::Result<T, NBayesError>;

impl NBayesError {
    /// Create a new invalid configuration error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        NBayesError::InvalidConfig(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        NBayesError::Storage(msg.into())
    }

    /// Create a new snapshot error.
    pub fn snapshot<S: Into<String>>(msg: S) -> Self {
        NBayesError::Snapshot(msg.into())
    }

    /// Create a new degenerate score error.
    pub fn degenerate_score<S: Into<String>>(category: S, raw: f64) -> Self {
        NBayesError::DegenerateScore {
            category: category.into(),
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = NBayesError::invalid_config("k must be finite");
        assert_eq!(error.to_string(), "Invalid configuration: k must be finite");

        let error = NBayesError::storage("category table missing");
        assert_eq!(error.to_string(), "Storage error: category table missing");

        let error = NBayesError::snapshot("missing config");
        assert_eq!(error.to_string(), "Snapshot error: missing config");

        let error = NBayesError::degenerate_score("classA", 0.0);
        assert_eq!(
            error.to_string(),
            "Degenerate score for category 'classA': raw log score is 0"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let nbayes_error = NBayesError::from(io_error);

        match nbayes_error {
            NBayesError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
