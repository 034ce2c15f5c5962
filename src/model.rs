//! The trained language identification model
//!
//! A `Model` is built once (by `ModelStore::load` or the trainer), checked
//! against its structural invariants, and never mutated afterwards.

use crate::classifier::{Calibration, ClassifierKind, LinearClassifier};
use crate::error::{LangIdError, Result};
use crate::labels::LabelCodec;
use crate::vectorizer::Vectorizer;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Training hyperparameters carried along for provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Inverse regularization strength
    pub c: f64,
    /// Minimum document frequency for a vocabulary n-gram
    pub min_df: u32,
    /// Vocabulary cap (most frequent n-grams kept)
    pub max_features: Option<u32>,
    pub epochs: u32,
    pub learning_rate: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            c: 1.0,
            min_df: 1,
            max_features: None,
            epochs: 500,
            learning_rate: 0.5,
        }
    }
}

/// Unvalidated model components
#[derive(Debug, Clone)]
pub struct ModelParts {
    pub ngram_range: (usize, usize),
    pub lowercase: bool,
    pub sublinear_tf: bool,
    pub vocabulary: FxHashMap<String, usize>,
    pub idf: Vec<f64>,
    pub classifier: LinearClassifier,
    pub calibration: Option<Calibration>,
    pub labels: Vec<String>,
    pub hyperparameters: Hyperparameters,
}

/// Immutable trained artifact: vocabulary, IDF, weights, calibration, labels.
#[derive(Debug, Clone)]
pub struct Model {
    lowercase: bool,
    vectorizer: Vectorizer,
    classifier: LinearClassifier,
    calibration: Option<Calibration>,
    labels: LabelCodec,
    hyperparameters: Hyperparameters,
}

impl Model {
    /// Assemble a model, enforcing:
    /// - `1 <= ngram_min <= ngram_max`
    /// - vocabulary indices dense over `0..len` and `len(idf) == len(vocabulary)`
    /// - weight columns equal vocabulary size
    /// - one decision function per label (or one for a binary model)
    /// - calibration curves match the decision functions
    pub fn from_parts(parts: ModelParts) -> Result<Self> {
        let ModelParts {
            ngram_range,
            lowercase,
            sublinear_tf,
            vocabulary,
            idf,
            classifier,
            calibration,
            labels,
            hyperparameters,
        } = parts;

        let (min, max) = ngram_range;
        if min == 0 || min > max {
            return Err(LangIdError::corrupt(
                "ngram_range",
                format!("invalid range ({min}, {max})"),
            ));
        }

        validate_vocabulary(&vocabulary, &idf)?;

        let labels = LabelCodec::new(labels)?;

        if classifier.num_features() != vocabulary.len() {
            return Err(LangIdError::corrupt(
                "classifier.weights",
                format!(
                    "{} feature columns for a vocabulary of {}",
                    classifier.num_features(),
                    vocabulary.len()
                ),
            ));
        }
        let rows = classifier.num_rows();
        let binary_single_row = labels.len() == 2 && rows == 1;
        if rows != labels.len() && !binary_single_row {
            return Err(LangIdError::corrupt(
                "classifier.weights",
                format!("{rows} decision functions for {} labels", labels.len()),
            ));
        }

        if let Some(cal) = &calibration {
            cal.validate(rows)?;
        }

        Ok(Self {
            lowercase,
            vectorizer: Vectorizer::new(ngram_range, vocabulary, idf, sublinear_tf),
            classifier,
            calibration,
            labels,
            hyperparameters,
        })
    }

    pub fn lowercase(&self) -> bool {
        self.lowercase
    }

    pub fn vectorizer(&self) -> &Vectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LinearClassifier {
        &self.classifier
    }

    pub fn classifier_kind(&self) -> ClassifierKind {
        self.classifier.kind()
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// Whether predictions go through fitted calibration curves
    /// (otherwise softmax over raw scores)
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    pub fn labels(&self) -> &LabelCodec {
        &self.labels
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    /// Sorted set of language codes this model can emit
    pub fn supported_languages(&self) -> BTreeSet<String> {
        self.labels.supported()
    }
}

fn validate_vocabulary(vocabulary: &FxHashMap<String, usize>, idf: &[f64]) -> Result<()> {
    if vocabulary.is_empty() {
        return Err(LangIdError::corrupt("vocabulary", "empty vocabulary"));
    }
    if idf.len() != vocabulary.len() {
        return Err(LangIdError::corrupt(
            "idf",
            format!(
                "length {} does not match vocabulary size {}",
                idf.len(),
                vocabulary.len()
            ),
        ));
    }
    if let Some(pos) = idf.iter().position(|v| !v.is_finite()) {
        return Err(LangIdError::corrupt(format!("idf[{pos}]"), "non-finite value"));
    }

    let mut seen = vec![false; vocabulary.len()];
    for (gram, &index) in vocabulary {
        if index >= seen.len() {
            return Err(LangIdError::corrupt(
                "vocabulary",
                format!("index {index} for {gram:?} is out of range 0..{}", seen.len()),
            ));
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(LangIdError::corrupt(
                "vocabulary",
                format!("index {index} is assigned more than once"),
            ));
        }
    }
    Ok(())
}
