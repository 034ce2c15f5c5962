//! User-level configuration for langid
//!
//! Loaded from `~/.config/tfidf-langid/config.toml` (platform config dir).
//! Every field is optional; CLI flags override what is set here.
//!
//! ```toml
//! [model]
//! path = "/opt/models/tfidf_langid.json"
//!
//! [detect]
//! top_k = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-k used when neither the CLI nor the config sets one
pub const DEFAULT_TOP_K: usize = 1;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub detect: DetectConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Artifact to load instead of the default location
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DetectConfig {
    /// Number of ranked languages to print
    pub top_k: Option<usize>,
}

impl UserConfig {
    /// Load the user config file, falling back to defaults when it is
    /// missing or unreadable.
    pub fn load() -> Self {
        match Self::user_config_path().filter(|p| p.exists()) {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| toml::from_str::<UserConfig>(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(file_config) => {
                let mut config = UserConfig::default();
                config.merge(file_config);
                config
            }
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                UserConfig::default()
            }
        }
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tfidf-langid").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.model.path.is_some() {
            self.model.path = other.model.path;
        }
        if other.detect.top_k.is_some() {
            self.detect.top_k = other.detect.top_k;
        }
    }

    /// Configured model artifact, if any
    pub fn model_path(&self) -> Option<&Path> {
        self.model.path.as_deref()
    }

    /// Configured top-k, never below 1
    pub fn top_k(&self) -> usize {
        self.detect.top_k.unwrap_or(DEFAULT_TOP_K).max(1)
    }
}
