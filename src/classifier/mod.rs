//! Linear classifiers over TF-IDF features
//!
//! Architecture: TF-IDF vector → linear decision functions → calibration
//!
//! Both supported kinds score identically (`bias + W·x`); the kind is
//! provenance recorded in the artifact and picks the training objective.

pub mod calibration;
mod linear;
pub mod train;

pub use calibration::{
    calibrate, softmax, Calibration, CalibrationMethod, IsotonicCurve, SigmoidCurve,
};
pub use linear::LinearClassifier;
pub use train::{train, TrainConfig};

use crate::error::{LangIdError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of classifier kinds this build implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// One-vs-rest linear SVM (squared hinge)
    LinearSvm,
    /// Multinomial logistic regression
    LogisticRegression,
}

impl ClassifierKind {
    /// Artifact tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinearSvm => "linear_svm",
            Self::LogisticRegression => "logistic_regression",
        }
    }

    /// Resolve an artifact tag, rejecting kinds this build does not implement.
    pub fn from_tag(tag: &str) -> Result<Self> {
        tag.parse()
            .map_err(|_| LangIdError::UnsupportedClassifierKind(tag.to_string()))
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear_svm" | "svm" | "linearsvc" => Ok(Self::LinearSvm),
            "logistic_regression" | "logreg" => Ok(Self::LogisticRegression),
            other => Err(format!(
                "unknown classifier '{other}' (expected svm or logreg)"
            )),
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
