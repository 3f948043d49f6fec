//! Sparse tf-idf arithmetic and kNN selection.
//!
//! Vectors are slices of [`VectorItem`] sorted by dictionary index. The merge in
//! [`scalar_product`] relies on that order and does not check it; an unsorted
//! input yields a too-small product.

use crate::error::Result;
use crate::types::{CategoryEstimate, Neighbor, VectorItem};
use std::cmp::Ordering;

/// Two-pointer merge over index-sorted items. `idf` resolves a shared term's weight.
pub fn scalar_product<F>(u: &[VectorItem], v: &[VectorItem], mut idf: F) -> Result<f64>
where
    F: FnMut(&VectorItem) -> Result<f64>,
{
    let mut sp = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < u.len() && j < v.len() {
        match u[i].index.cmp(&v[j].index) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let w = idf(&u[i])?;
                sp += (u[i].tf * w) * (v[j].tf * w);
                i += 1;
                j += 1;
            }
        }
    }
    Ok(sp)
}

/// sqrt(sum((tf * idf)^2))
pub fn tfidf_norm<F>(items: &[VectorItem], mut idf: F) -> Result<f64>
where
    F: FnMut(&VectorItem) -> Result<f64>,
{
    let mut sum = 0.0;
    for item in items {
        let w = item.tf * idf(item)?;
        sum += w * w;
    }
    Ok(sum.sqrt())
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Cosine from a precomputed product and norms, rounded to two decimals.
/// `None` when either norm is zero.
pub fn cosine(scalar_product: f64, norm_u: f64, norm_v: f64) -> Option<f64> {
    let denominator = norm_u * norm_v;
    if denominator == 0.0 {
        return None;
    }
    Some(round2(scalar_product / denominator))
}

/// Drop neighbors at or below `min_similarity`, sort ascending and keep the last `k`.
pub fn select_nearest(mut scored: Vec<Neighbor>, k: usize, min_similarity: f64) -> Vec<Neighbor> {
    scored.retain(|n| n.similarity > min_similarity);
    scored.sort_by(|a, b| a.similarity.total_cmp(&b.similarity));
    let start = scored.len().saturating_sub(k);
    scored.split_off(start)
}

/// Majority vote over labelled neighbors. Equal counts go to the category seen
/// first in `neighbors`.
pub fn vote(neighbors: &[Neighbor]) -> Option<CategoryEstimate> {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for category in neighbors.iter().filter_map(|n| n.category.as_deref()) {
        match tally.iter_mut().find(|(c, _)| *c == category) {
            Some((_, count)) => *count += 1,
            None => tally.push((category, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for &(category, count) in &tally {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((category, count));
        }
    }
    let (category, votes) = best?;

    let total: f64 = neighbors
        .iter()
        .filter(|n| n.category.as_deref() == Some(category))
        .map(|n| n.similarity)
        .sum();
    Some(CategoryEstimate { category: category.to_string(), average_similarity: total / votes as f64, votes })
}

/// Strictly increasing indices, as produced by vector construction.
pub fn is_index_sorted(items: &[VectorItem]) -> bool {
    items.windows(2).all(|w| w[0].index < w[1].index)
}
