//! tfidf-langid - character n-gram TF-IDF language identification
//!
//! Text goes through NFKC normalization, a closed-vocabulary character
//! n-gram TF-IDF vectorizer, a linear classifier and a calibrator, and
//! comes out as a ranked list of language codes with probabilities.
//!
//! ```rust,ignore
//! use tfidf_langid::{ModelStore, Predictor, MODEL_PATH_ENV};
//!
//! let model = ModelStore::load_default(MODEL_PATH_ENV)?;
//! let predictor = Predictor::from(model);
//! let prediction = predictor.predict("Сәлем дүние", 3);
//! println!("{} ({:.1}%)", prediction.language, prediction.confidence * 100.0);
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod labels;
pub mod model;
pub mod normalize;
pub mod predictor;
pub mod store;
pub mod vectorizer;

#[cfg(test)]
mod test_fixtures;

pub use classifier::{
    train, Calibration, CalibrationMethod, ClassifierKind, LinearClassifier, TrainConfig,
};
pub use error::{LangIdError, Result};
pub use labels::LabelCodec;
pub use model::{Hyperparameters, Model, ModelParts};
pub use predictor::{LanguageScore, Prediction, Predictor};
pub use store::{ModelLocator, ModelStore, FORMAT_VERSION, MODEL_PATH_ENV};
pub use vectorizer::{FeatureVector, Vectorizer};

use std::collections::BTreeSet;

/// Sorted set of language codes supported by `model`
pub fn get_supported_languages(model: &Model) -> BTreeSet<String> {
    model.supported_languages()
}
