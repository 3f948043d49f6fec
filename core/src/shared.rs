//! Thread-shared handle around a [`Classifier`].
//!
//! Writers hold the lock for a whole operation. `refresh_weights` keeps it
//! across the idf and norm passes, so readers never see fresh idf values
//! paired with stale norms.

use crate::engine::Classifier;
use crate::error::Result;
use crate::types::CategoryEstimate;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedClassifier {
    inner: Arc<RwLock<Classifier>>,
}

impl SharedClassifier {
    pub fn new(classifier: Classifier) -> Self {
        Self { inner: Arc::new(RwLock::new(classifier)) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Classifier> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Classifier> {
        self.inner.write()
    }

    pub fn add_text(&self, text: &str) -> Result<usize> {
        self.inner.write().add_text(text)
    }

    pub fn build_vector(&self, name: &str, text: &str, category: Option<&str>) -> Result<bool> {
        Ok(self.inner.write().build_vector(name, text, category)?.is_some())
    }

    pub fn remove_vector(&self, name: &str) -> Result<()> {
        self.inner.write().remove_vector(name)
    }

    pub fn set_category(&self, name: &str, category: &str) -> Result<()> {
        self.inner.write().set_category(name, category)
    }

    pub fn category(&self, name: &str) -> Result<Option<String>> {
        self.inner.read().category(name)
    }

    pub fn vector_names(&self) -> Result<Vec<String>> {
        self.inner.read().vector_names()
    }

    pub fn refresh_weights(&self) -> Result<()> {
        self.inner.write().refresh_weights()
    }

    pub fn cosine_similarity(&self, u_name: &str, v_name: &str) -> Result<Option<f64>> {
        self.inner.read().cosine_similarity(u_name, v_name)
    }

    pub fn evaluate_category<S: AsRef<str>>(&self, target: &str, candidates: &[S]) -> Result<Option<CategoryEstimate>> {
        self.inner.read().evaluate_category(target, candidates)
    }
}
