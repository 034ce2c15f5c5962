//! Hand-built models for unit tests
//!
//! Three labels (EN, KK, RU) over a 12-entry character n-gram vocabulary.
//! Each label's row puts weight 3.0 on its own n-grams.

use crate::classifier::{Calibration, ClassifierKind, LinearClassifier};
use crate::model::{Hyperparameters, Model, ModelParts};
use rustc_hash::FxHashMap;

const GRAMS: [(&str, usize); 12] = [
    ("he", 0),
    ("lo", 0),
    ("wo", 0),
    ("th", 0),
    ("ә", 1),
    ("ү", 1),
    ("қ", 1),
    ("сә", 1),
    ("пр", 2),
    ("ив", 2),
    ("ми", 2),
    ("ир", 2),
];

pub(crate) const LABELS: [&str; 3] = ["EN", "KK", "RU"];

/// Fixture with explicit bias terms and optional calibration
pub(crate) fn fixture_model_with(bias: [f64; 3], calibration: Option<Calibration>) -> Model {
    let vocabulary: FxHashMap<String, usize> = GRAMS
        .iter()
        .enumerate()
        .map(|(i, &(g, _))| (g.to_string(), i))
        .collect();

    let rows: Vec<Vec<f64>> = (0..LABELS.len())
        .map(|class| {
            GRAMS
                .iter()
                .map(|&(_, owner)| if owner == class { 3.0 } else { 0.0 })
                .collect()
        })
        .collect();

    let classifier =
        LinearClassifier::new(ClassifierKind::LinearSvm, rows, bias.to_vec(), GRAMS.len())
            .expect("fixture weights are well-formed");

    Model::from_parts(ModelParts {
        ngram_range: (1, 2),
        lowercase: true,
        sublinear_tf: true,
        vocabulary,
        idf: (0..GRAMS.len()).map(|i| 1.0 + i as f64 / 100.0).collect(),
        classifier,
        calibration,
        labels: LABELS.iter().map(|l| l.to_string()).collect(),
        hyperparameters: Hyperparameters::default(),
    })
    .expect("fixture model is valid")
}

/// Uncalibrated fixture with small distinct biases
pub(crate) fn fixture_model() -> Model {
    fixture_model_with([0.1, 0.0, -0.1], None)
}
