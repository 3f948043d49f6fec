//! Vector-space classification of feed items.
//!
//! Text is normalized into stemmed terms, counted into a persistent
//! dictionary, and turned into sparse tf vectors. Items are classified by a
//! kNN vote over tf-idf cosine similarity against labelled vectors.

pub mod config;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod manager;
pub mod persist;
pub mod shared;
pub mod similarity;
pub mod tokenizer;
pub mod types;
pub mod vectors;

pub use config::ClassifierConfig;
pub use engine::Classifier;
pub use error::{ClassifierError, Result};
pub use manager::{FeedClassification, FeedItem, ItemCategory, LabeledFeed, Manager};
pub use shared::SharedClassifier;
pub use tokenizer::{tokenize, Language};
pub use types::{CategoryEstimate, Neighbor, Term, TermIndex, VectorEntry, VectorItem};
