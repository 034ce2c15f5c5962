//! CLI command definitions and handlers

mod detect;
mod train;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tfidf_langid::config::UserConfig;
use tfidf_langid::{
    CalibrationMethod, ClassifierKind, Model, ModelStore, Predictor, MODEL_PATH_ENV,
};

/// langid - character n-gram TF-IDF language identification
#[derive(Parser, Debug)]
#[command(name = "langid")]
#[command(
    version,
    about = "Detect the language of text with a character n-gram TF-IDF model",
    after_help = "\
Examples:
  langid detect \"Hello, how are you?\"         Top-1 language
  langid detect -k 3 -j \"Привет, как дела?\"    Top-3 as JSON
  langid detect -f a.txt -f b.txt               Several files in one batch
  langid detect                                 Interactive mode (reads stdin)
  langid languages                              List supported language codes
  langid train --corpus corpus.tsv -o model.json

Model lookup: --model, then [model] path in the config file, then the
default data-dir model, then $TFIDF_LANGID_MODEL_PATH."
)]
pub struct Cli {
    /// Model artifact to load
    #[arg(long, short = 'm', global = true)]
    pub model: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect the language of text, files, or stdin lines
    Detect {
        /// Text to analyze (optional with --file; omit both for interactive mode)
        text: Option<String>,

        /// Path to a text file (can be repeated)
        #[arg(long = "file", short = 'f')]
        files: Vec<PathBuf>,

        /// Number of ranked languages to show (default: config, else 1)
        #[arg(long, short = 'k')]
        top_k: Option<usize>,

        /// Output JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// List supported language codes
    Languages {
        /// Output JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Train a model from a LABEL<TAB>TEXT corpus
    Train {
        /// Corpus file, one `LABEL<TAB>TEXT` sample per line
        #[arg(long)]
        corpus: PathBuf,

        /// Where to write the model artifact
        #[arg(long, short = 'o')]
        output: PathBuf,

        /// Classifier: svm or logreg
        #[arg(long, default_value = "svm")]
        classifier: ClassifierKind,

        /// Fit probability calibration: sigmoid or isotonic
        #[arg(long)]
        calibration: Option<CalibrationMethod>,

        /// Minimum character n-gram length
        #[arg(long, default_value = "1")]
        ngram_min: usize,

        /// Maximum character n-gram length
        #[arg(long, default_value = "5")]
        ngram_max: usize,

        /// Minimum document frequency
        #[arg(long, default_value = "1")]
        min_df: u32,

        /// Keep only the N most frequent n-grams
        #[arg(long)]
        max_features: Option<u32>,

        /// Inverse regularization strength
        #[arg(long, short = 'c', default_value = "1.0")]
        regularization: f64,

        /// Gradient descent epochs
        #[arg(long, default_value = "500")]
        epochs: u32,

        /// Gradient descent step size
        #[arg(long, default_value = "0.5")]
        learning_rate: f64,
    },
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    let config = UserConfig::load();

    match cli.command {
        Commands::Detect {
            text,
            files,
            top_k,
            json,
        } => {
            let model = load_model(cli.model.as_deref(), &config)?;
            let top_k = top_k.unwrap_or_else(|| config.top_k()).max(1);
            detect::run(&Predictor::from(model), text, &files, top_k, json)
        }
        Commands::Languages { json } => {
            let model = load_model(cli.model.as_deref(), &config)?;
            let langs: Vec<String> = model.supported_languages().into_iter().collect();
            if json {
                println!("{}", serde_json::json!({ "languages": langs }));
            } else {
                println!("{}", langs.join(" "));
            }
            Ok(())
        }
        Commands::Train {
            corpus,
            output,
            classifier,
            calibration,
            ngram_min,
            ngram_max,
            min_df,
            max_features,
            regularization,
            epochs,
            learning_rate,
        } => {
            let train_config = tfidf_langid::TrainConfig {
                ngram_range: (ngram_min, ngram_max),
                min_df,
                max_features,
                classifier,
                c: regularization,
                epochs,
                learning_rate,
                calibration,
                ..Default::default()
            };
            train::run(&corpus, &output, &train_config)
        }
    }
}

/// Resolve the model: explicit flag, then config file, then default lookup.
fn load_model(flag: Option<&Path>, config: &UserConfig) -> Result<Model> {
    match flag.or(config.model_path()) {
        Some(path) => ModelStore::load(path)
            .with_context(|| format!("Failed to load model from {}", path.display())),
        None => ModelStore::load_default(MODEL_PATH_ENV).context("Failed to load default model"),
    }
}
