use crate::error::{ClassifierError, Result};
use crate::tokenizer::Language;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionError;
use sled::{Db, Tree};
use std::path::Path;

pub const STORE_VERSION: u32 = 1;

const TERMS: &str = "terms";
const TERM_ORDER: &str = "term_order";
const VECTORS: &str = "vectors";
const VECTOR_ORDER: &str = "vector_order";
const NORMS: &str = "norms";
const STATE: &str = "state";

const META_KEY: &[u8] = b"meta";
pub const DOCUMENT_COUNT_KEY: &[u8] = b"document_count";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMeta {
    pub version: u32,
    pub language: Language,
    pub created_at: String,
}

/// The trees backing one corpus, all living in a single sled database.
#[derive(Clone)]
pub struct Stores {
    db: Db,
    pub terms: Tree,
    pub term_order: Tree,
    pub vectors: Tree,
    pub vector_order: Tree,
    pub norms: Tree,
    pub state: Tree,
}

impl Stores {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let db = sled::open(root.as_ref())?;
        Self::from_db(db)
    }

    /// Database removed from disk when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        Ok(Self {
            terms: db.open_tree(TERMS)?,
            term_order: db.open_tree(TERM_ORDER)?,
            vectors: db.open_tree(VECTORS)?,
            vector_order: db.open_tree(VECTOR_ORDER)?,
            norms: db.open_tree(NORMS)?,
            state: db.open_tree(STATE)?,
            db,
        })
    }

    /// Monotonic across restarts.
    pub fn next_sequence(&self) -> Result<u64> {
        Ok(self.db.generate_id()?)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Write the store header on first open, or check it against `language` on reopen.
    pub fn ensure_meta(&self, language: Language) -> Result<StoreMeta> {
        if let Some(raw) = self.state.get(META_KEY)? {
            let meta: StoreMeta = serde_json::from_slice(&raw)?;
            if meta.language != language {
                return Err(ClassifierError::LanguageMismatch { stored: meta.language, requested: language });
            }
            return Ok(meta);
        }
        let meta = StoreMeta {
            version: STORE_VERSION,
            language,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
        };
        self.state.insert(META_KEY, serde_json::to_vec(&meta)?)?;
        Ok(meta)
    }

    pub fn load_document_count(&self) -> Result<u64> {
        match self.state.get(DOCUMENT_COUNT_KEY)? {
            Some(raw) => decode_u64(STATE, &raw),
            None => Ok(0),
        }
    }

    pub fn save_document_count(&self, count: u64) -> Result<()> {
        self.state.insert(DOCUMENT_COUNT_KEY, &count.to_be_bytes()[..])?;
        Ok(())
    }
}

/// Abort the surrounding sled transaction with `err`.
pub fn abort(err: impl Into<ClassifierError>) -> ConflictableTransactionError<ClassifierError> {
    ConflictableTransactionError::Abort(err.into())
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

pub fn decode_u64(tree: &'static str, bytes: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| ClassifierError::Corrupt { tree, reason: format!("expected 8 bytes, got {}", bytes.len()) })?;
    Ok(u64::from_be_bytes(arr))
}

pub fn decode_f64(tree: &'static str, bytes: &[u8]) -> Result<f64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| ClassifierError::Corrupt { tree, reason: format!("expected 8 bytes, got {}", bytes.len()) })?;
    Ok(f64::from_be_bytes(arr))
}

pub fn decode_str(tree: &'static str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ClassifierError::Corrupt { tree, reason: e.to_string() })
}
