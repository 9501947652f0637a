//! YAML snapshots of a trained classifier.
//!
//! A snapshot carries the configuration, the vocabulary and the per-category
//! records. Loading always yields an in-memory classifier regardless of the
//! backend the snapshot was taken from.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::classifier::Classifier;
use crate::classifier::config::ClassifierConfig;
use crate::error::{NBayesError, Result};
use crate::store::memory::MemoryStore;
use crate::store::{CategoryRecord, CategoryStore};
use crate::token::Token;
use crate::vocabulary::Vocabulary;

/// Leading line of every YAML document this module writes.
pub const DOCUMENT_MARKER: &str = "---";

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a, T: Token> {
    version: u32,
    config: &'a ClassifierConfig,
    vocab: &'a Vocabulary<T>,
    data: BTreeMap<String, CategoryRecord<T>>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "T: Token"))]
struct Snapshot<T: Token> {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    config: ClassifierConfig,
    #[serde(default)]
    vocab: Vocabulary<T>,
    #[serde(default)]
    data: BTreeMap<String, CategoryRecord<T>>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl<T: Token, S: CategoryStore<T>> Classifier<T, S> {
    /// Serialize the classifier to a YAML document starting with `---`.
    pub fn dump_to_string(&self) -> Result<String> {
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            config: &self.config,
            vocab: &self.vocab,
            data: self.store.records()?,
        };
        let yaml = serde_yaml::to_string(&snapshot)?;
        if yaml.starts_with(DOCUMENT_MARKER) {
            Ok(yaml)
        } else {
            Ok(format!("{DOCUMENT_MARKER}\n{yaml}"))
        }
    }

    /// Write the classifier snapshot to a file.
    ///
    /// The document is written to a temporary file in the target directory
    /// and renamed into place, so readers never observe a partial snapshot.
    pub fn dump_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.dump_to_string()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        info!(path = %path.display(), bytes = yaml.len(), "wrote classifier snapshot");
        Ok(())
    }

    /// Dump to `path` when given, otherwise return the YAML document.
    pub fn dump(&self, path: Option<&Path>) -> Result<Option<String>> {
        match path {
            Some(path) => {
                self.dump_to_file(path)?;
                Ok(None)
            }
            None => self.dump_to_string().map(Some),
        }
    }
}

impl<T: Token> Classifier<T> {
    /// Restore a classifier from a YAML snapshot.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let snapshot: Snapshot<T> = serde_yaml::from_str(yaml)?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(NBayesError::snapshot(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        snapshot.config.validate()?;

        let (store, repairs) = MemoryStore::from_records(snapshot.data);
        let vocab = snapshot.vocab;
        let unlisted = store
            .tokens()?
            .iter()
            .filter(|token| !vocab.contains(token))
            .count();
        if unlisted > 0 {
            // Untrain leaves such tokens behind; the vocabulary is kept as written.
            debug!(unlisted, "stored tokens outside the vocabulary");
        }

        info!(
            categories = store.len(),
            vocab_size = vocab.len(),
            repairs,
            "loaded classifier snapshot"
        );
        Ok(Classifier::from_parts(snapshot.config, vocab, store))
    }

    /// Restore a classifier from a snapshot file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Load a classifier.
    ///
    /// `None` gives a fresh classifier. A string starting with `---` is
    /// parsed as a YAML document; anything else is taken as a file path.
    pub fn load(source: Option<&str>) -> Result<Self> {
        match source {
            None => Ok(Self::new()),
            Some(yaml) if yaml.starts_with(DOCUMENT_MARKER) => Self::from_yaml(yaml),
            Some(path) => Self::from_file(path),
        }
    }
}
