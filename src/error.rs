//! Error types for model loading, saving and training
//!
//! Prediction never fails: every error here is raised while resolving,
//! reading, validating or fitting a model artifact.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the language identification engine
#[derive(Error, Debug)]
pub enum LangIdError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Corrupt model artifact{}: {reason}", field_suffix(.field))]
    ModelCorrupt {
        field: Option<String>,
        reason: String,
    },

    #[error("Unsupported model format version {found} (this build supports up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Unsupported classifier kind: {0:?}")]
    UnsupportedClassifierKind(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Training failed: {0}")]
    Training(String),
}

impl LangIdError {
    /// Corrupt artifact with a known offending field
    pub(crate) fn corrupt(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelCorrupt {
            field: Some(field.into()),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(|f| format!(" (field `{f}`)"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, LangIdError>;
