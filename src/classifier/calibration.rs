//! Probability calibration
//!
//! Turns raw decision scores into a distribution over labels. When the
//! artifact carries fitted per-class curves they are applied and the
//! result renormalized; otherwise a max-shifted softmax is used.

use crate::error::{LangIdError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fitted per-class calibration curves stored in the artifact.
///
/// Serialized adjacently tagged: `{"method": "sigmoid", "curves": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "curves", rename_all = "snake_case")]
pub enum Calibration {
    Sigmoid(Vec<SigmoidCurve>),
    Isotonic(Vec<IsotonicCurve>),
}

/// Platt scaling: `p = 1 / (1 + exp(a * s + b))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidCurve {
    pub a: f64,
    pub b: f64,
}

/// Monotone piecewise-linear map, clipped outside `[x[0], x[last]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicCurve {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Which curve family to fit at training time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMethod {
    Sigmoid,
    Isotonic,
}

impl FromStr for CalibrationMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sigmoid" | "platt" => Ok(Self::Sigmoid),
            "isotonic" => Ok(Self::Isotonic),
            other => Err(format!(
                "unknown calibration method '{other}' (expected sigmoid or isotonic)"
            )),
        }
    }
}

impl fmt::Display for CalibrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sigmoid => write!(f, "sigmoid"),
            Self::Isotonic => write!(f, "isotonic"),
        }
    }
}

impl Calibration {
    pub fn method(&self) -> CalibrationMethod {
        match self {
            Self::Sigmoid(_) => CalibrationMethod::Sigmoid,
            Self::Isotonic(_) => CalibrationMethod::Isotonic,
        }
    }

    /// Number of per-class curves
    pub fn len(&self) -> usize {
        match self {
            Self::Sigmoid(c) => c.len(),
            Self::Isotonic(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check curve count against the classifier rows and curve contents.
    pub(crate) fn validate(&self, num_rows: usize) -> Result<()> {
        if self.len() != num_rows {
            return Err(LangIdError::corrupt(
                "calibration.curves",
                format!("{} curves for {num_rows} decision functions", self.len()),
            ));
        }
        match self {
            Self::Sigmoid(curves) => {
                for (i, c) in curves.iter().enumerate() {
                    if !c.a.is_finite() || !c.b.is_finite() {
                        return Err(LangIdError::corrupt(
                            format!("calibration.curves[{i}]"),
                            "non-finite sigmoid parameter",
                        ));
                    }
                }
            }
            Self::Isotonic(curves) => {
                for (i, c) in curves.iter().enumerate() {
                    c.validate()
                        .map_err(|reason| LangIdError::corrupt(format!("calibration.curves[{i}]"), reason))?;
                }
            }
        }
        Ok(())
    }

    /// Map each raw score through its class curve.
    fn apply(&self, scores: &[f64]) -> Vec<f64> {
        match self {
            Self::Sigmoid(curves) => scores
                .iter()
                .zip(curves)
                .map(|(&s, c)| c.eval(s))
                .collect(),
            Self::Isotonic(curves) => scores
                .iter()
                .zip(curves)
                .map(|(&s, c)| c.eval(s))
                .collect(),
        }
    }
}

impl SigmoidCurve {
    pub fn eval(&self, score: f64) -> f64 {
        1.0 / (1.0 + (self.a * score + self.b).exp())
    }

    /// Platt scaling fit (Newton's method with backtracking).
    ///
    /// Targets are prior-corrected: positives map to `(N+ + 1) / (N+ + 2)`,
    /// negatives to `1 / (N- + 2)`.
    pub fn fit(scores: &[f64], positive: &[bool]) -> Self {
        let n_pos = positive.iter().filter(|&&p| p).count() as f64;
        let n_neg = positive.len() as f64 - n_pos;
        let hi = (n_pos + 1.0) / (n_pos + 2.0);
        let lo = 1.0 / (n_neg + 2.0);
        let targets: Vec<f64> = positive.iter().map(|&p| if p { hi } else { lo }).collect();

        let loss = |a: f64, b: f64| -> f64 {
            scores
                .iter()
                .zip(&targets)
                .map(|(&s, &t)| {
                    let f = a * s + b;
                    softplus(f) - (1.0 - t) * f
                })
                .sum()
        };

        let mut a = 0.0;
        let mut b = ((n_neg + 1.0) / (n_pos + 1.0)).ln();
        let mut current = loss(a, b);

        for _ in 0..100 {
            let (mut ga, mut gb) = (0.0, 0.0);
            let (mut h11, mut h12, mut h22) = (1e-12, 0.0, 1e-12);
            for (&s, &t) in scores.iter().zip(&targets) {
                let p = 1.0 / (1.0 + (a * s + b).exp());
                let d = t - p;
                ga += d * s;
                gb += d;
                let w = p * (1.0 - p);
                h11 += w * s * s;
                h12 += w * s;
                h22 += w;
            }
            if ga.abs() < 1e-10 && gb.abs() < 1e-10 {
                break;
            }
            let det = h11 * h22 - h12 * h12;
            if det <= 0.0 {
                break;
            }
            let da = (h22 * ga - h12 * gb) / det;
            let db = (h11 * gb - h12 * ga) / det;

            let mut step = 1.0;
            let mut accepted = false;
            while step >= 1e-10 {
                let (na, nb) = (a - step * da, b - step * db);
                let next = loss(na, nb);
                if next < current {
                    a = na;
                    b = nb;
                    current = next;
                    accepted = true;
                    break;
                }
                step /= 2.0;
            }
            if !accepted {
                break;
            }
        }

        Self { a, b }
    }
}

impl IsotonicCurve {
    pub fn eval(&self, score: f64) -> f64 {
        let last = self.x.len() - 1;
        if score <= self.x[0] {
            return self.y[0];
        }
        if score >= self.x[last] {
            return self.y[last];
        }
        let j = self.x.partition_point(|&xi| xi <= score);
        let i = j - 1;
        let span = self.x[j] - self.x[i];
        if span <= 0.0 {
            return self.y[j];
        }
        let t = (score - self.x[i]) / span;
        self.y[i] + t * (self.y[j] - self.y[i])
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.x.is_empty() || self.x.len() != self.y.len() {
            return Err(format!(
                "x and y must be non-empty and equal length (got {} and {})",
                self.x.len(),
                self.y.len()
            ));
        }
        if self.x.iter().chain(&self.y).any(|v| !v.is_finite()) {
            return Err("non-finite value".into());
        }
        if self.x.windows(2).any(|w| w[1] < w[0]) {
            return Err("x thresholds are not sorted".into());
        }
        if self.y.iter().any(|&v| !(0.0..=1.0).contains(&v)) {
            return Err("y values must lie in [0, 1]".into());
        }
        Ok(())
    }

    /// Pool-adjacent-violators fit of a non-decreasing map from score to
    /// positive rate.
    pub fn fit(scores: &[f64], positive: &[bool]) -> Self {
        if scores.is_empty() {
            return Self {
                x: vec![0.0],
                y: vec![0.5],
            };
        }

        let mut pairs: Vec<(f64, f64)> = scores
            .iter()
            .zip(positive)
            .map(|(&s, &p)| (s, if p { 1.0 } else { 0.0 }))
            .collect();
        pairs.sort_by(|l, r| l.0.total_cmp(&r.0));

        // (x, mean target, weight) per distinct score
        let mut points: Vec<(f64, f64, f64)> = Vec::new();
        for (s, t) in pairs {
            match points.last_mut() {
                Some(last) if last.0 == s => {
                    last.1 = (last.1 * last.2 + t) / (last.2 + 1.0);
                    last.2 += 1.0;
                }
                _ => points.push((s, t, 1.0)),
            }
        }

        // Pooled blocks: (value, weight, number of points covered)
        let mut blocks: Vec<(f64, f64, usize)> = Vec::with_capacity(points.len());
        for &(_, y, w) in &points {
            blocks.push((y, w, 1));
            while blocks.len() > 1 {
                let n = blocks.len();
                let (v2, w2, c2) = blocks[n - 1];
                let (v1, w1, c1) = blocks[n - 2];
                if v1 <= v2 {
                    break;
                }
                blocks.truncate(n - 2);
                blocks.push(((v1 * w1 + v2 * w2) / (w1 + w2), w1 + w2, c1 + c2));
            }
        }

        let fitted: Vec<f64> = blocks
            .iter()
            .flat_map(|&(v, _, c)| std::iter::repeat(v).take(c))
            .collect();

        // Interior points inside a flat run carry no information
        let last = points.len() - 1;
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..points.len() {
            let keep = i == 0
                || i == last
                || fitted[i] != fitted[i - 1]
                || fitted[i] != fitted[i + 1];
            if keep {
                x.push(points[i].0);
                y.push(fitted[i]);
            }
        }

        Self { x, y }
    }
}

/// Max-shifted softmax.
///
/// Scores that overflowed to infinity share the whole mass evenly; a NaN
/// score (`inf - inf` in the dot product) gets none.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let scores: Vec<f64> = scores
        .iter()
        .map(|&s| if s.is_nan() { f64::NEG_INFINITY } else { s })
        .collect();
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        let top = scores.iter().filter(|&&s| s == max).count() as f64;
        return scores
            .iter()
            .map(|&s| if s == max { 1.0 / top } else { 0.0 })
            .collect();
    }
    let exps: Vec<f64> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Raw decision scores to a probability distribution over `num_labels`.
///
/// A single score from a binary decision function is expanded to
/// `[-s, s]` before softmax; a single calibration curve yields `[1 - p, p]`.
pub fn calibrate(raw: &[f64], calibration: Option<&Calibration>, num_labels: usize) -> Vec<f64> {
    match calibration {
        Some(cal) => {
            let mut probs = cal.apply(raw);
            if num_labels == 2 && probs.len() == 1 {
                probs = vec![1.0 - probs[0], probs[0]];
            }
            renormalize(probs)
        }
        None => {
            if num_labels == 2 && raw.len() == 1 {
                softmax(&[-raw[0], raw[0]])
            } else {
                softmax(raw)
            }
        }
    }
}

/// Rescale to sum to 1; falls back to uniform when every entry is zero.
fn renormalize(mut probs: Vec<f64>) -> Vec<f64> {
    for p in probs.iter_mut() {
        // `+ 0.0` turns -0.0 into 0.0 so zero entries tie when ranked
        *p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) + 0.0 };
    }
    let sum: f64 = probs.iter().sum();
    if sum > 0.0 {
        for p in probs.iter_mut() {
            *p /= sum;
        }
    } else {
        let uniform = 1.0 / probs.len() as f64;
        probs.iter_mut().for_each(|p| *p = uniform);
    }
    probs
}

fn softplus(f: f64) -> f64 {
    if f > 0.0 {
        f + (-f).exp().ln_1p()
    } else {
        f.exp().ln_1p()
    }
}
