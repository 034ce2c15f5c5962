//! Train command - fit a model from a TSV corpus and save it

use anyhow::{Context, Result};
use std::path::Path;
use tfidf_langid::classifier::train::read_corpus;
use tfidf_langid::{train, ModelStore, TrainConfig};

pub fn run(corpus: &Path, output: &Path, config: &TrainConfig) -> Result<()> {
    let samples = read_corpus(corpus)
        .with_context(|| format!("Failed to read corpus {}", corpus.display()))?;
    let model = train(&samples, config).context("Training failed")?;
    ModelStore::save(&model, output)
        .with_context(|| format!("Failed to save model to {}", output.display()))?;

    println!(
        "Trained {} on {} samples ({} languages, {} features{}) -> {}",
        model.classifier_kind(),
        samples.len(),
        model.num_labels(),
        model.vectorizer().len(),
        model
            .calibration()
            .map(|c| format!(", {} calibration", c.method()))
            .unwrap_or_default(),
        output.display()
    );
    Ok(())
}
