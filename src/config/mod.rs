//! Configuration module for langid
//!
//! User-level defaults (model location, top-k) read from a TOML file.

mod user_config;

pub use user_config::{DetectConfig, ModelConfig, UserConfig, DEFAULT_TOP_K};
