//! Detect command - single, batch, and interactive prediction

use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tfidf_langid::{Prediction, Predictor};

pub fn run(
    predictor: &Predictor,
    text: Option<String>,
    files: &[PathBuf],
    top_k: usize,
    json: bool,
) -> Result<()> {
    let mut inputs: Vec<String> = Vec::new();
    if let Some(text) = text {
        inputs.push(text);
    }
    for path in files {
        if !path.exists() {
            bail!("File not found: {}", path.display());
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        inputs.push(String::from_utf8_lossy(&bytes).into_owned());
    }

    if inputs.is_empty() {
        return interactive(predictor, top_k, json);
    }

    let results = predictor.predict_batch(&inputs, top_k);
    if json {
        if results.len() == 1 {
            println!("{}", serde_json::to_string(&results[0])?);
        } else {
            println!("{}", serde_json::to_string(&results)?);
        }
    } else {
        for (i, pred) in results.iter().enumerate() {
            let prefix = if results.len() == 1 {
                String::new()
            } else {
                format!("[{}] ", i + 1)
            };
            println!("{}{}", prefix, format_prediction(pred));
        }
    }
    Ok(())
}

/// Read lines from stdin until EOF or quit
fn interactive(predictor: &Predictor, top_k: usize, json: bool) -> Result<()> {
    println!("langid interactive mode. Type text or \"quit\" to exit.");
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "q" | "quit" | "exit") {
            break;
        }

        let pred = predictor.predict(line, top_k);
        if json {
            println!("{}", serde_json::to_string(&pred)?);
        } else {
            println!("{}", format_prediction(&pred));
        }
    }
    Ok(())
}

/// `EN (97.1%)`, plus `| Top: EN:97.1%, RU:2.0%` when more than one is ranked
fn format_prediction(pred: &Prediction) -> String {
    let head = format!("{} ({:.1}%)", pred.language, pred.confidence * 100.0);
    if pred.len() <= 1 {
        return head;
    }
    let top = pred
        .iter()
        .map(|s| format!("{}:{:.1}%", s.language, s.confidence * 100.0))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{head} | Top: {top}")
}
