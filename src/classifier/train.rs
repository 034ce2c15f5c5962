//! Training for the language classifier
//!
//! Fits the vocabulary, IDF table, linear weights and (optionally)
//! calibration curves from labelled text. Full-batch gradient descent,
//! no shuffling: the same corpus and config always give the same model.

use super::calibration::{Calibration, CalibrationMethod, IsotonicCurve, SigmoidCurve};
use super::{softmax, ClassifierKind, LinearClassifier};
use crate::error::{LangIdError, Result};
use crate::model::{Hyperparameters, Model, ModelParts};
use crate::normalize::normalize;
use crate::vectorizer::{for_each_ngram, FeatureVector, Vectorizer};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeSet;
use std::path::Path;

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Inclusive character n-gram lengths
    pub ngram_range: (usize, usize),
    pub lowercase: bool,
    /// `1 + ln(count)` term weighting
    pub sublinear_tf: bool,
    /// Minimum number of documents an n-gram must appear in
    pub min_df: u32,
    /// Keep only the most frequent n-grams
    pub max_features: Option<u32>,
    pub classifier: ClassifierKind,
    /// Inverse regularization strength
    pub c: f64,
    pub epochs: u32,
    pub learning_rate: f64,
    /// Fit per-class probability curves on the training scores
    pub calibration: Option<CalibrationMethod>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 5),
            lowercase: true,
            sublinear_tf: true,
            min_df: 1,
            max_features: None,
            classifier: ClassifierKind::LinearSvm,
            c: 1.0,
            epochs: 500,
            learning_rate: 0.5,
            calibration: None,
        }
    }
}

impl TrainConfig {
    fn validate(&self) -> Result<()> {
        let (min, max) = self.ngram_range;
        if min == 0 || min > max {
            return Err(LangIdError::Training(format!(
                "invalid n-gram range ({min}, {max})"
            )));
        }
        if !(self.c > 0.0) {
            return Err(LangIdError::Training("C must be positive".into()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(LangIdError::Training("learning rate must be positive".into()));
        }
        if self.epochs == 0 {
            return Err(LangIdError::Training("epochs must be at least 1".into()));
        }
        if self.max_features == Some(0) {
            return Err(LangIdError::Training("max_features must be at least 1".into()));
        }
        Ok(())
    }
}

/// Parse a `LABEL<TAB>TEXT` corpus. Blank lines and `#` comments are skipped.
pub fn parse_corpus(content: &str) -> Result<Vec<(String, String)>> {
    let mut samples = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((label, text)) = line.split_once('\t') else {
            return Err(LangIdError::Training(format!(
                "line {}: expected LABEL<TAB>TEXT",
                n + 1
            )));
        };
        let label = label.trim();
        if label.is_empty() {
            return Err(LangIdError::Training(format!("line {}: empty label", n + 1)));
        }
        samples.push((label.to_string(), text.to_string()));
    }
    Ok(samples)
}

/// Read and parse a corpus file
pub fn read_corpus(path: &Path) -> Result<Vec<(String, String)>> {
    let content = std::fs::read_to_string(path).map_err(|e| LangIdError::io(path, e))?;
    parse_corpus(&content)
}

/// Train a model on `(label, text)` samples.
pub fn train<S: AsRef<str>>(samples: &[(S, S)], config: &TrainConfig) -> Result<Model> {
    config.validate()?;

    let labels: Vec<String> = samples
        .iter()
        .map(|(l, _)| l.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if labels.len() < 2 {
        return Err(LangIdError::Training(format!(
            "need samples for at least 2 languages, found {}",
            labels.len()
        )));
    }
    let label_index: FxHashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    let targets: Vec<usize> = samples
        .iter()
        .map(|(l, _)| label_index[l.as_ref()])
        .collect();

    let docs: Vec<String> = samples
        .iter()
        .map(|(_, t)| normalize(t.as_ref(), config.lowercase))
        .collect();

    tracing::info!(
        "Training {} on {} samples, {} languages",
        config.classifier,
        docs.len(),
        labels.len()
    );

    let (vocabulary, idf) = fit_vocabulary(&docs, config)?;
    tracing::info!("Vocabulary: {} n-grams", vocabulary.len());

    let vectorizer = Vectorizer::new(
        config.ngram_range,
        vocabulary.clone(),
        idf.clone(),
        config.sublinear_tf,
    );
    let features: Vec<FeatureVector> = docs.iter().map(|d| vectorizer.vectorize(d)).collect();

    let num_rows = if labels.len() == 2 { 1 } else { labels.len() };
    let (weights, bias) = fit_weights(&features, &targets, num_rows, vocabulary.len(), config)?;
    let classifier =
        LinearClassifier::new(config.classifier, weights, bias, vocabulary.len())?;

    let calibration = config
        .calibration
        .map(|method| fit_calibration(method, &classifier, &features, &targets));

    Model::from_parts(ModelParts {
        ngram_range: config.ngram_range,
        lowercase: config.lowercase,
        sublinear_tf: config.sublinear_tf,
        vocabulary,
        idf,
        classifier,
        calibration,
        labels,
        hyperparameters: Hyperparameters {
            c: config.c,
            min_df: config.min_df,
            max_features: config.max_features,
            epochs: config.epochs,
            learning_rate: config.learning_rate,
        },
    })
}

/// Vocabulary (lexicographic indices) and smoothed IDF:
/// `ln((1 + n) / (1 + df)) + 1`
fn fit_vocabulary(
    docs: &[String],
    config: &TrainConfig,
) -> Result<(FxHashMap<String, usize>, Vec<f64>)> {
    let (min, max) = config.ngram_range;
    // n-gram -> (document frequency, corpus frequency)
    let mut stats: FxHashMap<String, (u32, u64)> = FxHashMap::default();

    for doc in docs {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for_each_ngram(doc, min, max, |gram| {
            if !seen.contains(gram) {
                seen.insert(gram.to_string());
            }
            stats.entry(gram.to_string()).or_insert((0, 0)).1 += 1;
        });
        for gram in seen {
            if let Some(entry) = stats.get_mut(&gram) {
                entry.0 += 1;
            }
        }
    }

    let mut kept: Vec<(String, u32, u64)> = stats
        .into_iter()
        .filter(|(_, (df, _))| *df >= config.min_df)
        .map(|(g, (df, tf))| (g, df, tf))
        .collect();

    if let Some(cap) = config.max_features {
        kept.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        kept.truncate(cap as usize);
    }
    if kept.is_empty() {
        return Err(LangIdError::Training(
            "empty vocabulary (no n-grams pass min_df)".into(),
        ));
    }
    kept.sort_by(|a, b| a.0.cmp(&b.0));

    let n = docs.len() as f64;
    let idf: Vec<f64> = kept
        .iter()
        .map(|(_, df, _)| ((1.0 + n) / (1.0 + *df as f64)).ln() + 1.0)
        .collect();
    let vocabulary = kept
        .into_iter()
        .enumerate()
        .map(|(i, (g, _, _))| (g, i))
        .collect();

    Ok((vocabulary, idf))
}

/// Class whose membership row `row` separates
fn positive_class(row: usize, num_rows: usize) -> usize {
    if num_rows == 1 {
        1
    } else {
        row
    }
}

/// d(loss)/d(score) for one sample
fn score_gradient(kind: ClassifierKind, scores: &[f64], target: usize) -> (Vec<f64>, f64) {
    let num_rows = scores.len();
    match kind {
        ClassifierKind::LogisticRegression if num_rows == 1 => {
            let p = 1.0 / (1.0 + (-scores[0]).exp());
            let t = if target == 1 { 1.0 } else { 0.0 };
            let loss = -(if t > 0.5 { p } else { 1.0 - p }).max(1e-15).ln();
            (vec![p - t], loss)
        }
        ClassifierKind::LogisticRegression => {
            let mut probs = softmax(scores);
            let loss = -probs[target].max(1e-15).ln();
            probs[target] -= 1.0;
            (probs, loss)
        }
        ClassifierKind::LinearSvm => {
            let mut loss = 0.0;
            let grad = scores
                .iter()
                .enumerate()
                .map(|(r, &s)| {
                    let y = if positive_class(r, num_rows) == target { 1.0 } else { -1.0 };
                    let slack = 1.0 - y * s;
                    if slack > 0.0 {
                        loss += slack * slack;
                        -2.0 * slack * y
                    } else {
                        0.0
                    }
                })
                .collect();
            (grad, loss)
        }
    }
}

type Weights = (Vec<Vec<f64>>, Vec<f64>);

fn fit_weights(
    features: &[FeatureVector],
    targets: &[usize],
    num_rows: usize,
    num_features: usize,
    config: &TrainConfig,
) -> Result<Weights> {
    let n = features.len() as f64;
    let reg = 1.0 / (config.c * n);
    let lr = config.learning_rate;

    let mut weights = vec![vec![0.0f64; num_features]; num_rows];
    let mut bias = vec![0.0f64; num_rows];

    for epoch in 0..config.epochs {
        let mut grad_w = vec![vec![0.0f64; num_features]; num_rows];
        let mut grad_b = vec![0.0f64; num_rows];
        let mut epoch_loss = 0.0;

        for (x, &target) in features.iter().zip(targets) {
            let scores: Vec<f64> = (0..num_rows)
                .map(|r| bias[r] + x.iter().map(|(f, v)| weights[r][f] * v).sum::<f64>())
                .collect();
            let (g, loss) = score_gradient(config.classifier, &scores, target);
            epoch_loss += loss;
            for (r, &gr) in g.iter().enumerate() {
                if gr == 0.0 {
                    continue;
                }
                grad_b[r] += gr;
                for (f, v) in x.iter() {
                    grad_w[r][f] += gr * v;
                }
            }
        }

        for r in 0..num_rows {
            bias[r] -= lr * grad_b[r] / n;
            for (w, g) in weights[r].iter_mut().zip(&grad_w[r]) {
                *w -= lr * (g / n + reg * *w);
            }
        }

        if epoch % 50 == 0 || epoch + 1 == config.epochs {
            tracing::debug!(
                "Epoch {}/{}: loss={:.4}",
                epoch + 1,
                config.epochs,
                epoch_loss / n
            );
        }
    }

    let diverged = bias
        .iter()
        .chain(weights.iter().flatten())
        .any(|v| !v.is_finite());
    if diverged {
        return Err(LangIdError::Training(
            "weights diverged; lower the learning rate".into(),
        ));
    }

    Ok((weights, bias))
}

fn fit_calibration(
    method: CalibrationMethod,
    classifier: &LinearClassifier,
    features: &[FeatureVector],
    targets: &[usize],
) -> Calibration {
    let scores: Vec<Vec<f64>> = features.iter().map(|x| classifier.score(x)).collect();
    let num_rows = classifier.num_rows();

    let per_row = |r: usize| -> (Vec<f64>, Vec<bool>) {
        let positive = positive_class(r, num_rows);
        (
            scores.iter().map(|s| s[r]).collect(),
            targets.iter().map(|&t| t == positive).collect(),
        )
    };

    match method {
        CalibrationMethod::Sigmoid => Calibration::Sigmoid(
            (0..num_rows)
                .map(|r| {
                    let (s, y) = per_row(r);
                    SigmoidCurve::fit(&s, &y)
                })
                .collect(),
        ),
        CalibrationMethod::Isotonic => Calibration::Isotonic(
            (0..num_rows)
                .map(|r| {
                    let (s, y) = per_row(r);
                    IsotonicCurve::fit(&s, &y)
                })
                .collect(),
        ),
    }
}
