use serde::{Deserialize, Serialize};

/// Stable position of a term in the dictionary, assigned on first sight.
pub type TermIndex = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub text: String,
    pub index: TermIndex,
    /// Number of documents the term appeared in.
    pub document_frequency: u64,
    pub idf: f64,
}

impl Term {
    pub fn new(text: impl Into<String>, index: TermIndex) -> Self {
        Self { text: text.into(), index, document_frequency: 1, idf: 0.0 }
    }
}

/// One coordinate of a sparse vector. `index` mirrors the dictionary index of `term`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorItem {
    pub term: String,
    pub index: TermIndex,
    /// Raw count scaled by the count of the most frequent term, in (0, 1].
    pub tf: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub name: String,
    /// Sorted by `index`, ascending.
    pub items: Vec<VectorItem>,
    pub category: Option<String>,
    /// Key of this entry in the insertion-order tree.
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub name: String,
    pub category: Option<String>,
    pub similarity: f64,
}

/// Outcome of a kNN vote.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEstimate {
    pub category: String,
    /// Mean similarity of the neighbors that voted for `category`.
    pub average_similarity: f64,
    pub votes: usize,
}
