//! Ranked language predictions
//!
//! normalize → vectorize → score → calibrate → decode → rank
//!
//! The model is shared read-only; every call builds its own feature
//! vector, so one `Predictor` can serve many threads at once.

use crate::classifier::calibrate;
use crate::model::Model;
use crate::normalize::normalize;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One candidate language with its probability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageScore {
    pub language: String,
    pub confidence: f64,
}

/// Ranked prediction for a single text.
///
/// `top_k` is sorted by descending confidence, ties by ascending code.
/// Confidences are probabilities over the full label set, so the omitted
/// tail carries the remaining mass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Most likely language
    pub language: String,
    /// Its probability
    pub confidence: f64,
    pub top_k: Vec<LanguageScore>,
}

impl Prediction {
    pub fn len(&self) -> usize {
        self.top_k.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top_k.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageScore> {
        self.top_k.iter()
    }
}

/// Runs texts through a loaded model
#[derive(Debug, Clone)]
pub struct Predictor {
    model: Arc<Model>,
}

impl Predictor {
    pub fn new(model: Arc<Model>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Full probability distribution in label order. Sums to 1.
    pub fn predict_proba(&self, text: &str) -> Vec<f64> {
        let model = &*self.model;
        let normalized = normalize(text, model.lowercase());
        let features = model.vectorizer().vectorize(&normalized);
        let raw = model.classifier().score(&features);
        calibrate(&raw, model.calibration(), model.num_labels())
    }

    /// Rank languages for `text`, keeping `top_k` (clamped to `1..=labels`).
    ///
    /// Empty or unrecognizable input still ranks, driven by the bias terms.
    pub fn predict(&self, text: &str, top_k: usize) -> Prediction {
        let probs = self.predict_proba(text);
        self.rank(&probs, top_k)
    }

    /// Same results as calling `predict` on each text in order.
    pub fn predict_batch<S>(&self, texts: &[S], top_k: usize) -> Vec<Prediction>
    where
        S: AsRef<str> + Sync,
    {
        texts
            .par_iter()
            .map(|t| self.predict(t.as_ref(), top_k))
            .collect()
    }

    /// Most likely language code
    pub fn detect(&self, text: &str) -> String {
        self.predict(text, 1).language
    }

    /// Sorted set of language codes the model can emit
    pub fn supported_languages(&self) -> BTreeSet<String> {
        self.model.supported_languages()
    }

    fn rank(&self, probs: &[f64], top_k: usize) -> Prediction {
        let labels = self.model.labels();
        let mut ranked: Vec<LanguageScore> = probs
            .iter()
            .enumerate()
            .map(|(i, &p)| LanguageScore {
                language: labels.decode(i).to_string(),
                confidence: p,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.language.cmp(&b.language))
        });
        ranked.truncate(top_k.clamp(1, labels.len()));

        let best = &ranked[0];
        Prediction {
            language: best.language.clone(),
            confidence: best.confidence,
            top_k: ranked,
        }
    }
}

impl From<Model> for Predictor {
    fn from(model: Model) -> Self {
        Self::new(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Calibration, IsotonicCurve, SigmoidCurve};
    use crate::test_fixtures::{fixture_model, fixture_model_with, LABELS};

    fn predictor() -> Predictor {
        Predictor::from(fixture_model())
    }

    #[test]
    fn test_scenario_languages() {
        let p = predictor();
        for (text, expected) in [
            ("Hello world", "EN"),
            ("Привет мир", "RU"),
            ("Сәлем дүние", "KK"),
        ] {
            let pred = p.predict(text, 1);
            assert_eq!(pred.len(), 1);
            assert_eq!(pred.language, expected, "{text}");
            assert!(pred.confidence > 0.5, "{text}: {}", pred.confidence);
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let p = predictor();
        for text in ["", "   ", "Hello", "zzzz", "Привет мир", "Сәлем"] {
            let probs = p.predict_proba(text);
            assert_eq!(probs.len(), LABELS.len());
            let sum: f64 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "{text}: {sum}");
            assert!(probs.iter().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn test_empty_input_ranked_by_bias() {
        let pred = predictor().predict("", 3);
        let langs: Vec<&str> = pred.iter().map(|s| s.language.as_str()).collect();
        assert_eq!(langs, vec!["EN", "KK", "RU"]);
    }

    #[test]
    fn test_ties_break_by_code() {
        let p = Predictor::from(fixture_model_with([0.0, 0.0, 0.0], None));
        let pred = p.predict("12345", 3);
        let langs: Vec<&str> = pred.iter().map(|s| s.language.as_str()).collect();
        assert_eq!(langs, vec!["EN", "KK", "RU"]);
        assert!(pred.iter().all(|s| (s.confidence - 1.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_zero_probabilities_tie_by_code() {
        let curve = |y: f64| IsotonicCurve {
            x: vec![0.0],
            y: vec![y],
        };
        let cal = Calibration::Isotonic(vec![curve(1.0), curve(-0.0), curve(0.0)]);
        let pred = Predictor::from(fixture_model_with([0.0; 3], Some(cal))).predict("", 3);
        let langs: Vec<&str> = pred.iter().map(|s| s.language.as_str()).collect();
        assert_eq!(langs, vec!["EN", "KK", "RU"]);
    }

    #[test]
    fn test_top_k_clamped() {
        let p = predictor();
        assert_eq!(p.predict("Hello", 0).len(), 1);
        assert_eq!(p.predict("Hello", 99).len(), LABELS.len());
    }

    #[test]
    fn test_ranking_non_increasing() {
        let pred = predictor().predict("hello привет сәлем", 3);
        assert!(pred
            .top_k
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence));
        assert_eq!(pred.language, pred.top_k[0].language);
    }

    #[test]
    fn test_calibrated_branch() {
        let curves = vec![SigmoidCurve { a: -2.0, b: 1.0 }; 3];
        let p = Predictor::from(fixture_model_with([0.0; 3], Some(Calibration::Sigmoid(curves))));
        let pred = p.predict("Привет мир", 3);
        assert_eq!(pred.language, "RU");
        let sum: f64 = p.predict_proba("Привет мир").iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let p = predictor();
        let texts = vec!["Hello world", "", "Привет мир", "Сәлем дүние", "xyz"];
        let batch = p.predict_batch(&texts, 2);
        let single: Vec<Prediction> = texts.iter().map(|t| p.predict(t, 2)).collect();
        assert_eq!(batch, single);
    }

    #[test]
    fn test_detect_and_supported() {
        let p = predictor();
        assert_eq!(p.detect("Hello world"), "EN");
        let langs: Vec<String> = p.supported_languages().into_iter().collect();
        assert_eq!(langs, vec!["EN", "KK", "RU"]);
    }

    #[test]
    fn test_shared_across_threads() {
        let p = predictor();
        let expected = p.predict("Привет мир", 3);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let p = p.clone();
                std::thread::spawn(move || p.predict("Привет мир", 3))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    }
}
