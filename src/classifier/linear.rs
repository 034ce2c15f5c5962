//! Linear decision function shared by all supported classifier kinds
//!
//! `score_c = bias_c + Σ weight[c][f] * x[f]`

use super::ClassifierKind;
use crate::error::{LangIdError, Result};
use crate::vectorizer::FeatureVector;

/// Per-class linear weights.
///
/// Weights are stored row-major in one flat buffer
/// `[num_rows x num_features]`. A binary model may have a single row
/// (the decision function of the second label).
#[derive(Debug, Clone, PartialEq)]
pub struct LinearClassifier {
    kind: ClassifierKind,
    weights: Vec<f64>,
    bias: Vec<f64>,
    num_rows: usize,
    num_features: usize,
}

impl LinearClassifier {
    /// Build from per-row weights, checking shape and finiteness.
    pub fn new(
        kind: ClassifierKind,
        rows: Vec<Vec<f64>>,
        bias: Vec<f64>,
        num_features: usize,
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(LangIdError::corrupt("classifier.weights", "no weight rows"));
        }
        if bias.len() != rows.len() {
            return Err(LangIdError::corrupt(
                "classifier.bias",
                format!("length {} does not match {} weight rows", bias.len(), rows.len()),
            ));
        }
        if let Some(pos) = bias.iter().position(|b| !b.is_finite()) {
            return Err(LangIdError::corrupt(
                format!("classifier.bias[{pos}]"),
                "non-finite value",
            ));
        }

        let num_rows = rows.len();
        let mut weights = Vec::with_capacity(num_rows * num_features);
        for (c, row) in rows.into_iter().enumerate() {
            if row.len() != num_features {
                return Err(LangIdError::corrupt(
                    format!("classifier.weights[{c}]"),
                    format!("has {} columns, expected {num_features}", row.len()),
                ));
            }
            if row.iter().any(|w| !w.is_finite()) {
                return Err(LangIdError::corrupt(
                    format!("classifier.weights[{c}]"),
                    "non-finite value",
                ));
            }
            weights.extend(row);
        }

        Ok(Self {
            kind,
            weights,
            bias,
            num_rows,
            num_features,
        })
    }

    pub fn kind(&self) -> ClassifierKind {
        self.kind
    }

    /// Number of decision functions (1 for a single-row binary model)
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    /// Weights of decision function `row`
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.num_features;
        &self.weights[start..start + self.num_features]
    }

    /// Weight rows as nested vectors (artifact layout)
    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.num_rows).map(|r| self.row(r).to_vec()).collect()
    }

    /// Raw decision scores, one per row.
    ///
    /// The zero vector yields the bias terms.
    pub fn score(&self, x: &FeatureVector) -> Vec<f64> {
        (0..self.num_rows)
            .map(|r| {
                let w = self.row(r);
                let mut sum = self.bias[r];
                for (f, v) in x.iter() {
                    if f < self.num_features {
                        sum += w[f] * v;
                    }
                }
                sum
            })
            .collect()
    }
}
