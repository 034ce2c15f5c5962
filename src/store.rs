//! Model artifact persistence
//!
//! One versioned JSON document holds the whole trained model. Loading
//! checks the format version first, then deserializes, then runs the
//! `Model` invariant checks, so a bad artifact fails at load time and
//! never at predict time.
//!
//! Default artifact: `<data_dir>/tfidf-langid/tfidf_langid.json`, with
//! `TFIDF_LANGID_MODEL_PATH` as fallback when that file is absent.

use crate::classifier::{Calibration, ClassifierKind, LinearClassifier};
use crate::error::{LangIdError, Result};
use crate::model::{Hyperparameters, Model, ModelParts};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Newest artifact format this build reads and the one it writes
pub const FORMAT_VERSION: u32 = 1;

/// Environment variable consulted when the default artifact is absent
pub const MODEL_PATH_ENV: &str = "TFIDF_LANGID_MODEL_PATH";

/// File name of the default artifact
pub const DEFAULT_MODEL_FILE: &str = "tfidf_langid.json";

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactFile {
    format_version: u32,
    ngram_range: (usize, usize),
    lowercase: bool,
    sublinear_tf: bool,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    classifier: ClassifierSection,
    #[serde(default)]
    calibration: Option<Calibration>,
    labels: Vec<String>,
    #[serde(default)]
    hyperparameters: Hyperparameters,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassifierSection {
    /// Kept as a string so unknown kinds surface as their own error
    kind: String,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: Option<u32>,
}

/// Reads and writes model artifacts
pub struct ModelStore;

impl ModelStore {
    /// Load and validate an artifact from `path`.
    pub fn load(path: &Path) -> Result<Model> {
        if !path.exists() {
            return Err(LangIdError::ModelNotFound(format!(
                "model file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| LangIdError::io(path, e))?;
        let model = Self::from_json(&content)?;

        tracing::info!(
            "Loaded {} model from {} ({} labels, {} features, {})",
            model.classifier_kind(),
            path.display(),
            model.num_labels(),
            model.vectorizer().len(),
            if model.is_calibrated() { "calibrated" } else { "softmax" }
        );
        Ok(model)
    }

    /// Resolve the default artifact (falling back to `env_var`) and load it.
    pub fn load_default(env_var: &str) -> Result<Model> {
        let path = ModelLocator::new(env_var).resolve()?;
        Self::load(&path)
    }

    /// Write `model` to `path` as pretty JSON, creating parent directories.
    pub fn save(model: &Model, path: &Path) -> Result<()> {
        let content = Self::to_json(model)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| LangIdError::io(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| LangIdError::io(path, e))?;
        tracing::info!("Model saved to {}", path.display());
        Ok(())
    }

    /// Parse an artifact from a JSON string.
    pub fn from_json(json: &str) -> Result<Model> {
        let probe: VersionProbe = serde_json::from_str(json).map_err(corrupt)?;
        match probe.format_version {
            None => {
                return Err(LangIdError::corrupt("format_version", "missing version tag"));
            }
            Some(found) if found == 0 || found > FORMAT_VERSION => {
                return Err(LangIdError::UnsupportedVersion {
                    found,
                    supported: FORMAT_VERSION,
                });
            }
            Some(_) => {}
        }

        let artifact: ArtifactFile = serde_json::from_str(json).map_err(corrupt)?;
        let kind = ClassifierKind::from_tag(&artifact.classifier.kind)?;
        let num_features = artifact.vocabulary.len();
        let classifier = LinearClassifier::new(
            kind,
            artifact.classifier.weights,
            artifact.classifier.bias,
            num_features,
        )?;

        Model::from_parts(ModelParts {
            ngram_range: artifact.ngram_range,
            lowercase: artifact.lowercase,
            sublinear_tf: artifact.sublinear_tf,
            vocabulary: artifact.vocabulary.into_iter().collect(),
            idf: artifact.idf,
            classifier,
            calibration: artifact.calibration,
            labels: artifact.labels,
            hyperparameters: artifact.hyperparameters,
        })
    }

    /// Serialize `model` to the current artifact format.
    pub fn to_json(model: &Model) -> Result<String> {
        let vectorizer = model.vectorizer();
        let classifier = model.classifier();
        let artifact = ArtifactFile {
            format_version: FORMAT_VERSION,
            ngram_range: vectorizer.ngram_range(),
            lowercase: model.lowercase(),
            sublinear_tf: vectorizer.sublinear_tf(),
            vocabulary: vectorizer
                .vocabulary()
                .iter()
                .map(|(g, &i)| (g.clone(), i))
                .collect(),
            idf: vectorizer.idf().to_vec(),
            classifier: ClassifierSection {
                kind: classifier.kind().as_str().to_string(),
                weights: classifier.rows(),
                bias: classifier.bias().to_vec(),
            },
            calibration: model.calibration().cloned(),
            labels: model.labels().labels().to_vec(),
            hyperparameters: model.hyperparameters().clone(),
        };
        Ok(serde_json::to_string_pretty(&artifact)?)
    }
}

fn corrupt(e: serde_json::Error) -> LangIdError {
    LangIdError::ModelCorrupt {
        field: None,
        reason: e.to_string(),
    }
}

/// Default artifact location under the user data directory
pub fn default_model_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("tfidf-langid").join(DEFAULT_MODEL_FILE))
}

/// Resolves which artifact file to load: the bundled default when it
/// exists, otherwise the path named by an environment variable.
#[derive(Debug, Clone)]
pub struct ModelLocator {
    default_path: Option<PathBuf>,
    env_var: String,
}

impl ModelLocator {
    pub fn new(env_var: impl Into<String>) -> Self {
        Self {
            default_path: default_model_path(),
            env_var: env_var.into(),
        }
    }

    /// Locator with an explicit default location
    pub fn with_default_path(default_path: impl Into<PathBuf>, env_var: impl Into<String>) -> Self {
        Self {
            default_path: Some(default_path.into()),
            env_var: env_var.into(),
        }
    }

    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(default) = self.default_path.as_ref().filter(|p| p.exists()) {
            tracing::debug!("Using default model at {}", default.display());
            return Ok(default.clone());
        }

        let env_path = std::env::var(&self.env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        if let Some(path) = env_path.as_ref().filter(|p| p.exists()) {
            tracing::debug!("Using model from ${} at {}", self.env_var, path.display());
            return Ok(path.clone());
        }

        let expected = self
            .default_path
            .as_ref()
            .map(|p| format!("Expected at '{}'. ", p.display()))
            .unwrap_or_default();
        let env_note = match env_path {
            Some(p) => format!("${} points to '{}', which does not exist.", self.env_var, p.display()),
            None => format!(
                "You can set environment variable {} to point to '{}'.",
                self.env_var, DEFAULT_MODEL_FILE
            ),
        };
        Err(LangIdError::ModelNotFound(format!("{expected}{env_note}")))
    }
}
