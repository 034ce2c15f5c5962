//! Bidirectional mapping between language codes and class indices

use crate::error::{LangIdError, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Label codec built once from the artifact's ordered label list.
#[derive(Debug, Clone)]
pub struct LabelCodec {
    labels: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl LabelCodec {
    /// Requires at least two distinct, non-empty codes.
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.len() < 2 {
            return Err(LangIdError::corrupt(
                "labels",
                format!("need at least 2 labels, found {}", labels.len()),
            ));
        }

        let mut index = FxHashMap::default();
        for (i, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(LangIdError::corrupt(format!("labels[{i}]"), "empty label"));
            }
            if index.insert(label.clone(), i).is_some() {
                return Err(LangIdError::corrupt(
                    format!("labels[{i}]"),
                    format!("duplicate label {label:?}"),
                ));
            }
        }

        Ok(Self { labels, index })
    }

    /// Language code for a class index.
    ///
    /// # Panics
    ///
    /// When `class_index >= self.len()`. Indices only come from the fixed
    /// size score vector, so this is a programming error.
    pub fn decode(&self, class_index: usize) -> &str {
        &self.labels[class_index]
    }

    /// Class index for a language code
    pub fn encode(&self, code: &str) -> Option<usize> {
        self.index.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in class-index order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Sorted set of language codes
    pub fn supported(&self) -> BTreeSet<String> {
        self.labels.iter().cloned().collect()
    }
}
