//! Feed-level training and classification on top of the engine.
//!
//! A labelled feed contributes one document to the dictionary and one vector
//! named after the feed. An unlabelled feed is classified item by item against
//! the vectors that existed before it arrived.

use crate::engine::Classifier;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledFeed {
    pub name: String,
    pub category: String,
    pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCategory {
    pub item_id: String,
    pub vector_name: String,
    pub category: String,
    pub average_similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedClassification {
    pub feed: String,
    /// Items that received a category. Items without one are dropped.
    pub items: Vec<ItemCategory>,
    /// Most frequent item category.
    pub category: Option<String>,
}

pub fn item_vector_name(feed: &str, item_id: &str) -> String {
    format!("{feed}_{item_id}")
}

fn feed_text(items: &[FeedItem]) -> String {
    items.iter().map(|i| i.text.as_str()).collect::<Vec<_>>().join(" ")
}

pub struct Manager {
    classifier: Classifier,
}

impl Manager {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn classifier_mut(&mut self) -> &mut Classifier {
        &mut self.classifier
    }

    pub fn into_inner(self) -> Classifier {
        self.classifier
    }

    /// Add every feed as a document and a labelled vector, then refresh weights.
    /// Returns the number of vectors built.
    pub fn train_feeds(&mut self, feeds: &[LabeledFeed]) -> Result<usize> {
        let mut built = 0usize;
        for feed in feeds {
            let text = feed_text(&feed.items);
            self.classifier.add_text(&text)?;
            if self.classifier.build_vector(&feed.name, &text, Some(feed.category.as_str()))?.is_some() {
                built += 1;
                tracing::debug!(feed = %feed.name, category = %feed.category, "feed vector added");
            }
        }
        self.classifier.refresh_weights()?;
        tracing::info!(num_feeds = feeds.len(), built, "training feeds added");
        Ok(built)
    }

    /// Classify each item of an unlabelled feed against the existing vectors.
    ///
    /// Item vectors left by an earlier run are not rebuilt; they are evaluated
    /// again against every other vector and relabelled.
    pub fn classify_feed(&mut self, feed: &str, items: &[FeedItem]) -> Result<FeedClassification> {
        let candidates = self.classifier.vector_names()?;
        let mut results = Vec::new();

        for item in items {
            let name = item_vector_name(feed, &item.id);
            let fresh = !self.classifier.contains_vector(&name)?;
            if fresh && self.classifier.build_vector(&name, &item.text, None)?.is_none() {
                continue;
            }
            let others: Vec<&str> = candidates.iter().map(String::as_str).filter(|c| *c != name).collect();
            let Some(estimate) = self.classifier.evaluate_category(&name, &others)? else {
                if fresh {
                    self.classifier.remove_vector(&name)?;
                }
                continue;
            };
            self.classifier.set_category(&name, &estimate.category)?;
            tracing::info!(item = %name, category = %estimate.category, "item categorized");
            results.push(ItemCategory {
                item_id: item.id.clone(),
                vector_name: name,
                category: estimate.category,
                average_similarity: estimate.average_similarity,
            });
        }

        let category = most_common(results.iter().map(|r| r.category.as_str()));
        match &category {
            Some(c) => tracing::info!(feed, category = %c, "general category set"),
            None => tracing::warn!(feed, "no item of the feed could be categorized"),
        }
        Ok(FeedClassification { feed: feed.to_string(), items: results, category })
    }

    /// Remove the feed's own vector.
    pub fn remove_feed(&mut self, name: &str) -> Result<()> {
        self.classifier.remove_vector(name)
    }
}

/// Most frequent value; ties go to the first seen.
fn most_common<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for v in values {
        match tally.iter_mut().find(|(c, _)| *c == v) {
            Some((_, n)) => *n += 1,
            None => tally.push((v, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for &(v, n) in &tally {
        if best.map_or(true, |(_, b)| n > b) {
            best = Some((v, n));
        }
    }
    best.map(|(v, _)| v.to_string())
}
