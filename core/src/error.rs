//! Error types for the classification engine.

use sled::transaction::TransactionError;
use thiserror::Error;

use crate::tokenizer::Language;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("vector not found: {name}")]
    VectorNotFound { name: String },

    /// Vector names are only reusable after removal.
    #[error("vector already exists: {name}")]
    VectorExists { name: String },

    /// A stored vector breaks the ordering or dictionary contract.
    #[error("inconsistent vector state for {name}: {reason}")]
    InconsistentVectorState { name: String, reason: String },

    #[error("store was built for {stored:?} text but {requested:?} was requested")]
    LanguageMismatch { stored: Language, requested: Language },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("corrupt record in tree {tree}: {reason}")]
    Corrupt { tree: &'static str, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("metadata error: {0}")]
    Meta(#[from] serde_json::Error),
}

impl From<TransactionError<ClassifierError>> for ClassifierError {
    fn from(err: TransactionError<ClassifierError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => ClassifierError::Storage(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
