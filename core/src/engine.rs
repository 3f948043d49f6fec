//! The classification engine.
//!
//! [`Classifier`] owns the dictionary (with the corpus counter), the vector
//! store and the norm cache of one corpus. Mutating operations take `&mut self`;
//! sharing across threads goes through [`crate::shared::SharedClassifier`].
//!
//! Norms are derived from idf values. After [`Classifier::recompute_idf`] every
//! cached norm is stale until [`Classifier::recompute_all_norms`] runs;
//! [`Classifier::refresh_weights`] runs both in order.

use crate::config::ClassifierConfig;
use crate::dictionary::Dictionary;
use crate::error::{ClassifierError, Result};
use crate::persist::Stores;
use crate::similarity::{self, cosine, select_nearest, vote};
use crate::tokenizer::{tokenize, Language};
use crate::types::{CategoryEstimate, Neighbor, Term, VectorEntry, VectorItem};
use crate::vectors::VectorStore;
use std::collections::HashMap;

pub struct Classifier {
    config: ClassifierConfig,
    stores: Stores,
    dictionary: Dictionary,
    vectors: VectorStore,
}

impl Classifier {
    /// Open or create the stores under `config.data_dir`.
    pub fn open(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        let stores = Stores::open(&config.data_dir)?;
        Self::with_stores(config, stores)
    }

    /// Stores live in a temporary database, dropped with the classifier.
    pub fn temporary(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Self::with_stores(config, Stores::temporary()?)
    }

    fn with_stores(config: ClassifierConfig, stores: Stores) -> Result<Self> {
        stores.ensure_meta(config.language)?;
        let dictionary = Dictionary::load(&stores)?;
        let vectors = VectorStore::new(&stores);
        tracing::info!(
            num_docs = dictionary.document_count(),
            num_terms = dictionary.len(),
            num_vectors = vectors.len(),
            language = %config.language,
            "classifier opened"
        );
        Ok(Self { config, stores, dictionary, vectors })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.config.language
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(text, self.config.language)
    }

    // ---- dictionary ----

    /// Feed one document to the dictionary. Returns the number of distinct terms.
    pub fn add_text(&mut self, text: &str) -> Result<usize> {
        let words = self.tokenize(text);
        let distinct = self.dictionary.add_document(words.iter().map(String::as_str))?;
        tracing::debug!(distinct, num_docs = self.dictionary.document_count(), "text added");
        Ok(distinct)
    }

    pub fn observe(&mut self, term: &str) -> Result<u64> {
        self.dictionary.observe(term)
    }

    pub fn lookup(&self, term: &str) -> Result<Option<Term>> {
        self.dictionary.lookup(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = Result<Term>> + '_ {
        self.dictionary.terms()
    }

    pub fn document_count(&self) -> u64 {
        self.dictionary.document_count()
    }

    pub fn term_count(&self) -> u64 {
        self.dictionary.len()
    }

    pub fn recompute_idf(&mut self) -> Result<usize> {
        self.dictionary.recompute_idf()
    }

    // ---- vectors ----

    /// Build and store a vector from `text`. Terms unknown to the dictionary are
    /// skipped. Returns `None` when the text has no terms after normalization.
    /// A stored vector is never rebuilt: an existing name fails with `VectorExists`.
    pub fn build_vector(&mut self, name: &str, text: &str, category: Option<&str>) -> Result<Option<VectorEntry>> {
        if self.vectors.contains(name)? {
            return Err(ClassifierError::VectorExists { name: name.to_string() });
        }
        let words = self.tokenize(text);
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for word in &words {
            *counts.entry(word.as_str()).or_insert(0) += 1;
        }
        let Some(&max_count) = counts.values().max() else {
            tracing::debug!(name, "empty text, no vector built");
            return Ok(None);
        };

        let mut items = Vec::with_capacity(counts.len());
        for (word, count) in counts {
            if let Some(term) = self.dictionary.lookup(word)? {
                items.push(VectorItem { term: term.text, index: term.index, tf: count as f64 / max_count as f64 });
            }
        }
        items.sort_by_key(|item| item.index);

        let norm = self.tfidf_norm_of(name, &items)?;
        let entry = self.vectors.insert(name, items, category.map(str::to_string), norm)?;
        tracing::debug!(name, num_items = entry.items.len(), norm, "vector built");
        Ok(Some(entry))
    }

    /// Absent names are ignored.
    pub fn remove_vector(&mut self, name: &str) -> Result<()> {
        if self.vectors.remove(name)? {
            tracing::debug!(name, "vector removed");
        }
        Ok(())
    }

    pub fn set_category(&mut self, name: &str, category: &str) -> Result<()> {
        self.vectors.set_category(name, Some(category.to_string()))
    }

    pub fn category(&self, name: &str) -> Result<Option<String>> {
        Ok(self.vectors.get(name)?.and_then(|v| v.category))
    }

    pub fn vector(&self, name: &str) -> Result<Option<VectorEntry>> {
        self.vectors.get(name)
    }

    pub fn contains_vector(&self, name: &str) -> Result<bool> {
        self.vectors.contains(name)
    }

    /// Vector names in insertion order.
    pub fn vector_names(&self) -> Result<Vec<String>> {
        self.vectors.names().collect()
    }

    pub fn vectors(&self) -> impl Iterator<Item = Result<VectorEntry>> + '_ {
        self.vectors.entries()
    }

    pub fn vector_count(&self) -> usize {
        self.vectors.len()
    }

    /// Cached norm of a stored vector.
    pub fn norm(&self, name: &str) -> Result<Option<f64>> {
        self.vectors.norm(name)
    }

    /// Norm of `items` against the live idf values. Nothing is stored.
    pub fn tfidf_norm(&self, items: &[VectorItem]) -> Result<f64> {
        self.tfidf_norm_of("<ad hoc>", items)
    }

    fn tfidf_norm_of(&self, name: &str, items: &[VectorItem]) -> Result<f64> {
        similarity::tfidf_norm(items, |item| self.dictionary.idf_for(name, &item.term))
    }

    /// Written as one batch, so a failed pass leaves the previous norms in place.
    pub fn recompute_all_norms(&mut self) -> Result<usize> {
        let mut updates = Vec::with_capacity(self.vectors.len());
        for entry in self.vectors.entries() {
            let entry = entry?;
            let norm = self.tfidf_norm_of(&entry.name, &entry.items)?;
            updates.push((entry.name, norm));
        }
        let updated = updates.len();
        self.vectors.set_norms(updates)?;
        tracing::info!(num_vectors = updated, "recomputed vector norms");
        Ok(updated)
    }

    /// Recompute idf, then every norm, then flush.
    pub fn refresh_weights(&mut self) -> Result<()> {
        self.recompute_idf()?;
        self.recompute_all_norms()?;
        self.flush()
    }

    /// Check that a stored vector is index-sorted and agrees with the dictionary.
    pub fn verify_vector(&self, name: &str) -> Result<()> {
        let entry = self.vectors.get(name)?.ok_or_else(|| ClassifierError::VectorNotFound { name: name.to_string() })?;
        let inconsistent = |reason: String| ClassifierError::InconsistentVectorState { name: name.to_string(), reason };
        if !similarity::is_index_sorted(&entry.items) {
            return Err(inconsistent("items are not sorted by dictionary index".into()));
        }
        for item in &entry.items {
            match self.dictionary.lookup(&item.term)? {
                Some(term) if term.index == item.index => {}
                Some(term) => {
                    return Err(inconsistent(format!(
                        "term {:?} recorded at index {} but dictionary has {}",
                        item.term, item.index, term.index
                    )))
                }
                None => return Err(inconsistent(format!("term {:?} missing from dictionary", item.term))),
            }
        }
        Ok(())
    }

    // ---- similarity ----

    pub fn scalar_product(&self, u: &VectorEntry, v: &VectorEntry) -> Result<f64> {
        similarity::scalar_product(&u.items, &v.items, |item| self.dictionary.idf_for(&u.name, &item.term))
    }

    /// Cosine similarity of two stored vectors, rounded to two decimals.
    /// `None` when either vector is absent; `0.0` when either norm is zero.
    pub fn cosine_similarity(&self, u_name: &str, v_name: &str) -> Result<Option<f64>> {
        let (Some(u), Some(v)) = (self.vectors.get(u_name)?, self.vectors.get(v_name)?) else {
            tracing::debug!(u_name, v_name, "cosine similarity on absent vector");
            return Ok(None);
        };
        let norm_u = self.stored_norm(u_name)?;
        let norm_v = self.stored_norm(v_name)?;
        let sp = self.scalar_product(&u, &v)?;
        let sim = cosine(sp, norm_u, norm_v).unwrap_or_else(|| {
            tracing::warn!(u_name, v_name, "division by zero norm, similarity set to 0");
            0.0
        });
        tracing::trace!(u_name, v_name, sim, "cosine similarity");
        Ok(Some(sim))
    }

    fn stored_norm(&self, name: &str) -> Result<f64> {
        self.vectors.norm(name)?.ok_or_else(|| ClassifierError::InconsistentVectorState {
            name: name.to_string(),
            reason: "vector has no cached norm".into(),
        })
    }

    /// The `k` most similar candidates above `min_similarity`, ascending by similarity.
    /// Every candidate is scored; absent candidates are skipped.
    pub fn k_nearest<S: AsRef<str>>(
        &self,
        target: &str,
        candidates: &[S],
        k: usize,
        min_similarity: f64,
    ) -> Result<Vec<Neighbor>> {
        let mut scored = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let candidate = candidate.as_ref();
            let Some(similarity) = self.cosine_similarity(target, candidate)? else {
                continue;
            };
            if similarity <= min_similarity {
                continue;
            }
            let category = self.category(candidate)?;
            scored.push(Neighbor { name: candidate.to_string(), category, similarity });
        }
        Ok(select_nearest(scored, k, min_similarity))
    }

    /// Category of `target` by majority vote of its nearest labelled candidates,
    /// using the configured `k` and `min_similarity`.
    pub fn evaluate_category<S: AsRef<str>>(&self, target: &str, candidates: &[S]) -> Result<Option<CategoryEstimate>> {
        let neighbors = self.k_nearest(target, candidates, self.config.k, self.config.min_similarity)?;
        let estimate = vote(&neighbors);
        match &estimate {
            Some(e) => tracing::debug!(
                target,
                category = %e.category,
                votes = e.votes,
                average = e.average_similarity,
                "category evaluated"
            ),
            None => tracing::debug!(target, num_neighbors = neighbors.len(), "no category found"),
        }
        Ok(estimate)
    }

    pub fn flush(&self) -> Result<()> {
        self.stores.flush()
    }
}
