//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use tfidf_langid::classifier::train::parse_corpus;
use tfidf_langid::{train, Model, TrainConfig};

/// Path to the test fixtures directory
pub fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// EN/RU/KK training samples
pub fn corpus() -> Vec<(String, String)> {
    parse_corpus(include_str!("../fixtures/corpus.tsv")).expect("fixture corpus parses")
}

/// Small config that trains quickly on the fixture corpus
pub fn small_config() -> TrainConfig {
    TrainConfig {
        ngram_range: (1, 4),
        c: 100.0,
        epochs: 400,
        ..Default::default()
    }
}

pub fn trained_model() -> Model {
    train_with(small_config())
}

pub fn train_with(config: TrainConfig) -> Model {
    train(&corpus(), &config).expect("training on fixture corpus succeeds")
}
