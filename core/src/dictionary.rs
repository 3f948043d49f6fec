//! Term dictionary and the corpus document counter.
//!
//! Terms are keyed by text in the `terms` tree and by big-endian index in
//! `term_order`, so a scan of `term_order` yields terms in insertion order.
//! Indices are never reused.

use crate::error::{ClassifierError, Result};
use crate::persist::{abort, decode, decode_str, decode_u64, encode, Stores, DOCUMENT_COUNT_KEY};
use crate::types::{Term, TermIndex};
use sled::transaction::{ConflictableTransactionResult, TransactionalTree};
use sled::{Transactional, Tree};
use std::collections::HashSet;

pub struct Dictionary {
    stores: Stores,
    terms: Tree,
    term_order: Tree,
    next_index: TermIndex,
    document_count: u64,
}

type TxResult<T> = ConflictableTransactionResult<T, ClassifierError>;

/// Count one occurrence of `term` inside a transaction, allocating `next_index`
/// when the term is new. Returns the index and whether it was allocated.
fn observe_in(terms: &TransactionalTree, order: &TransactionalTree, term: &str, next_index: TermIndex) -> TxResult<(TermIndex, bool)> {
    if let Some(raw) = terms.get(term.as_bytes())? {
        let mut existing: Term = decode(&raw).map_err(abort)?;
        existing.document_frequency += 1;
        terms.insert(term.as_bytes(), encode(&existing).map_err(abort)?)?;
        return Ok((existing.index, false));
    }
    terms.insert(term.as_bytes(), encode(&Term::new(term, next_index)).map_err(abort)?)?;
    order.insert(next_index.to_be_bytes().to_vec(), term.as_bytes())?;
    Ok((next_index, true))
}

impl Dictionary {
    /// Load counters, restoring any `term_order` key missing for a stored term.
    pub fn load(stores: &Stores) -> Result<Self> {
        let mut next_index = match stores.term_order.last()? {
            Some((key, _)) => decode_u64("term_order", &key)? + 1,
            None => 0,
        };
        for record in stores.terms.iter() {
            let (key, raw) = record?;
            let term: Term = decode(&raw)?;
            let order_key = term.index.to_be_bytes();
            match stores.term_order.get(order_key)? {
                Some(text) if text == key => {}
                Some(text) => {
                    return Err(ClassifierError::Corrupt {
                        tree: "term_order",
                        reason: format!(
                            "index {} claimed by {:?} and {:?}",
                            term.index,
                            decode_str("term_order", &text)?,
                            term.text
                        ),
                    })
                }
                None => {
                    tracing::warn!(term = %term.text, index = term.index, "restoring missing term order entry");
                    stores.term_order.insert(order_key, key)?;
                }
            }
            next_index = next_index.max(term.index + 1);
        }
        let document_count = stores.load_document_count()?;
        Ok(Self {
            terms: stores.terms.clone(),
            term_order: stores.term_order.clone(),
            stores: stores.clone(),
            next_index,
            document_count,
        })
    }

    pub fn document_count(&self) -> u64 {
        self.document_count
    }

    /// Number of distinct terms ever observed.
    pub fn len(&self) -> u64 {
        self.next_index
    }

    pub fn is_empty(&self) -> bool {
        self.next_index == 0
    }

    /// Record one document's occurrence of `term`. Callers deduplicate per document.
    pub fn observe(&mut self, term: &str) -> Result<TermIndex> {
        let next_index = self.next_index;
        let (index, created) =
            (&self.terms, &self.term_order).transaction(|(terms, order)| observe_in(terms, order, term, next_index))?;
        if created {
            self.next_index += 1;
        }
        Ok(index)
    }

    /// Observe every distinct term of one document and count the document,
    /// all in one transaction.
    pub fn add_document<'a, I>(&mut self, terms: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let distinct: Vec<&str> = terms.into_iter().filter(|t| seen.insert(*t)).collect();
        let first_index = self.next_index;
        let count = self.document_count + 1;
        let created = (&self.terms, &self.term_order, &self.stores.state).transaction(|(terms, order, state)| -> TxResult<u64> {
            let mut next_index = first_index;
            for term in &distinct {
                if observe_in(terms, order, term, next_index)?.1 {
                    next_index += 1;
                }
            }
            state.insert(DOCUMENT_COUNT_KEY, count.to_be_bytes().to_vec())?;
            Ok(next_index - first_index)
        })?;
        self.next_index += created;
        self.document_count = count;
        Ok(distinct.len())
    }

    pub fn lookup(&self, term: &str) -> Result<Option<Term>> {
        match self.terms.get(term.as_bytes())? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Current idf of a term referenced by the named vector.
    pub fn idf_for(&self, vector: &str, term: &str) -> Result<f64> {
        self.lookup(term)?.map(|t| t.idf).ok_or_else(|| ClassifierError::InconsistentVectorState {
            name: vector.to_string(),
            reason: format!("term {term:?} missing from dictionary"),
        })
    }

    pub fn idf(&self, document_frequency: u64) -> f64 {
        if self.document_count == 0 {
            tracing::warn!(document_frequency, "idf undefined with an empty corpus, using 0");
            return 0.0;
        }
        (self.document_count as f64 / document_frequency as f64).ln()
    }

    /// Rewrite every term's idf from the current document count.
    pub fn recompute_idf(&mut self) -> Result<usize> {
        if self.document_count == 0 {
            tracing::warn!("recomputing idf with no documents; every idf is set to 0");
        }
        let mut batch = sled::Batch::default();
        let mut updated = 0usize;
        for record in self.terms.iter() {
            let (key, raw) = record?;
            let mut term: Term = decode(&raw)?;
            term.idf = if self.document_count == 0 { 0.0 } else { self.idf(term.document_frequency) };
            batch.insert(key, encode(&term)?);
            updated += 1;
        }
        self.terms.apply_batch(batch)?;
        tracing::info!(num_terms = updated, num_docs = self.document_count, "recomputed idf");
        Ok(updated)
    }

    /// All terms in index order.
    pub fn terms(&self) -> impl Iterator<Item = Result<Term>> + '_ {
        self.term_order.iter().map(move |record| {
            let (_, text) = record?;
            let text = decode_str("term_order", &text)?;
            self.lookup(&text)?.ok_or_else(|| ClassifierError::Corrupt {
                tree: "terms",
                reason: format!("indexed term {text:?} has no entry"),
            })
        })
    }
}
