//! Vector store and its norm cache.
//!
//! `vectors` maps a name to a bincode [`VectorEntry`], `vector_order` maps the
//! entry's sequence number to its name, and `norms` holds the tf-idf norm of
//! each entry as a big-endian f64. The three trees are kept in step by this
//! module only.

use crate::error::{ClassifierError, Result};
use crate::persist::{abort, decode, decode_f64, decode_str, encode, Stores};
use crate::types::{VectorEntry, VectorItem};
use sled::transaction::ConflictableTransactionResult;
use sled::{Batch, Transactional, Tree};

type TxResult<T> = ConflictableTransactionResult<T, ClassifierError>;

pub struct VectorStore {
    stores: Stores,
    vectors: Tree,
    order: Tree,
    norms: Tree,
}

impl VectorStore {
    pub fn new(stores: &Stores) -> Self {
        Self {
            vectors: stores.vectors.clone(),
            order: stores.vector_order.clone(),
            norms: stores.norms.clone(),
            stores: stores.clone(),
        }
    }

    /// Store a new entry with its norm. Fails with `VectorExists` if the name is taken.
    pub fn insert(&self, name: &str, items: Vec<VectorItem>, category: Option<String>, norm: f64) -> Result<VectorEntry> {
        let entry = VectorEntry { name: name.to_string(), items, category, seq: self.stores.next_sequence()? };
        let encoded = encode(&entry)?;
        (&self.vectors, &self.order, &self.norms).transaction(|(vectors, order, norms)| -> TxResult<()> {
            if vectors.get(name.as_bytes())?.is_some() {
                return Err(abort(ClassifierError::VectorExists { name: name.to_string() }));
            }
            vectors.insert(name.as_bytes(), encoded.clone())?;
            order.insert(entry.seq.to_be_bytes().to_vec(), name.as_bytes())?;
            norms.insert(name.as_bytes(), norm.to_be_bytes().to_vec())?;
            Ok(())
        })?;
        Ok(entry)
    }

    /// Returns whether an entry was present.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let removed = (&self.vectors, &self.order, &self.norms).transaction(|(vectors, order, norms)| -> TxResult<bool> {
            norms.remove(name.as_bytes())?;
            let Some(raw) = vectors.remove(name.as_bytes())? else {
                return Ok(false);
            };
            let old: VectorEntry = decode(&raw).map_err(abort)?;
            order.remove(old.seq.to_be_bytes().to_vec())?;
            Ok(true)
        })?;
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Result<Option<VectorEntry>> {
        match self.vectors.get(name.as_bytes())? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.vectors.contains_key(name.as_bytes())?)
    }

    pub fn set_category(&self, name: &str, category: Option<String>) -> Result<()> {
        let mut entry = self.get(name)?.ok_or_else(|| ClassifierError::VectorNotFound { name: name.to_string() })?;
        entry.category = category;
        self.vectors.insert(name.as_bytes(), encode(&entry)?)?;
        Ok(())
    }

    pub fn norm(&self, name: &str) -> Result<Option<f64>> {
        match self.norms.get(name.as_bytes())? {
            Some(raw) => Ok(Some(decode_f64("norms", &raw)?)),
            None => Ok(None),
        }
    }

    /// Replace several norms atomically.
    pub fn set_norms(&self, updates: impl IntoIterator<Item = (String, f64)>) -> Result<()> {
        let mut batch = Batch::default();
        for (name, norm) in updates {
            batch.insert(name.as_bytes(), norm.to_be_bytes().to_vec());
        }
        self.norms.apply_batch(batch)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = Result<String>> + '_ {
        self.order.iter().map(|record| {
            let (_, name) = record?;
            decode_str("vector_order", &name)
        })
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = Result<VectorEntry>> + '_ {
        self.names().map(move |name| {
            let name = name?;
            self.get(&name)?.ok_or_else(|| ClassifierError::Corrupt {
                tree: "vectors",
                reason: format!("ordered vector {name:?} has no entry"),
            })
        })
    }
}
