//! A classifier handle that can be shared across threads.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::classifier::Classifier;
use crate::error::Result;
use crate::probability::Scores;
use crate::store::CategoryStore;
use crate::store::memory::MemoryStore;
use crate::token::Token;

/// Cloneable, thread-safe handle around a [`Classifier`].
///
/// Every operation takes the lock for its whole duration, so a `classify`
/// never observes a half-applied `train` or `untrain`.
pub struct SharedClassifier<T: Token, S: CategoryStore<T> = MemoryStore<T>> {
    inner: Arc<Mutex<Classifier<T, S>>>,
}

impl<T: Token, S: CategoryStore<T>> SharedClassifier<T, S> {
    pub fn new(classifier: Classifier<T, S>) -> Self {
        SharedClassifier {
            inner: Arc::new(Mutex::new(classifier)),
        }
    }

    pub fn train(&self, tokens: &[T], category: &str) -> Result<()> {
        self.inner.lock().train(tokens, category)
    }

    pub fn untrain(&self, tokens: &[T], category: &str) -> Result<()> {
        self.inner.lock().untrain(tokens, category)
    }

    pub fn classify(&self, tokens: &[T]) -> Result<Scores> {
        self.inner.lock().classify(tokens)
    }

    pub fn purge_less_than(&self, threshold: u64) -> Result<usize> {
        self.inner.lock().purge_less_than(threshold)
    }

    pub fn delete_category(&self, category: &str) -> Result<Vec<String>> {
        self.inner.lock().delete_category(category)
    }

    pub fn categories(&self) -> Result<Vec<String>> {
        self.inner.lock().categories()
    }

    pub fn dump_to_string(&self) -> Result<String> {
        self.inner.lock().dump_to_string()
    }

    pub fn dump_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.inner.lock().dump_to_file(path)
    }

    /// Run a closure with shared access to the classifier.
    pub fn with<R>(&self, f: impl FnOnce(&Classifier<T, S>) -> R) -> R {
        f(&self.inner.lock())
    }

    /// Run a closure with exclusive access to the classifier.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Classifier<T, S>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<T: Token, S: CategoryStore<T>> Clone for SharedClassifier<T, S> {
    fn clone(&self) -> Self {
        SharedClassifier {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Token, S: CategoryStore<T>> From<Classifier<T, S>> for SharedClassifier<T, S> {
    fn from(classifier: Classifier<T, S>) -> Self {
        Self::new(classifier)
    }
}

impl<T: Token, S: CategoryStore<T>> fmt::Debug for SharedClassifier<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedClassifier")
            .field("strong_count", &Arc::strong_count(&self.inner))
            .finish()
    }
}
