//! CLI tests: run the `langid` binary against a freshly trained model
//!
//! Each test trains into its own temp directory.

mod common;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_langid"))
}

/// Run langid and return (stdout, stderr, exit_code)
fn run_langid(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(binary_path())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute langid");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// Train a model from the fixture corpus via the CLI
fn train_model(dir: &TempDir) -> PathBuf {
    let corpus = common::fixtures_path().join("corpus.tsv");
    let model = dir.path().join("model.json");
    let (stdout, stderr, code) = run_langid(&[
        "train",
        "--corpus",
        corpus.to_str().unwrap(),
        "--output",
        model.to_str().unwrap(),
        "--ngram-max",
        "4",
        "-c",
        "100",
        "--epochs",
        "400",
    ]);
    assert_eq!(code, 0, "train failed: {stderr}");
    assert!(stdout.contains("Trained linear_svm on 30 samples"), "{stdout}");
    assert!(model.exists());
    model
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn test_detect_text() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_model(&dir);

    let (stdout, stderr, code) = run_langid(&["--model", path_str(&model), "detect", "Привет мир"]);
    assert_eq!(code, 0, "detect failed: {stderr}");
    assert!(stdout.starts_with("RU ("), "unexpected output: {stdout}");
}

#[test]
fn test_detect_json_single() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_model(&dir);

    let (stdout, _, code) = run_langid(&[
        "--model",
        path_str(&model),
        "detect",
        "--json",
        "-k",
        "3",
        "Сәлем дүние",
    ]);
    assert_eq!(code, 0);

    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON");
    assert_eq!(value["language"], "KK");
    assert!(value["confidence"].as_f64().unwrap() > 0.5);
    assert_eq!(value["top_k"].as_array().unwrap().len(), 3);
}

#[test]
fn test_detect_files_batch() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_model(&dir);
    let en = dir.path().join("en.txt");
    let ru = dir.path().join("ru.txt");
    std::fs::write(&en, "Hello world").unwrap();
    std::fs::write(&ru, "Привет мир").unwrap();

    let (stdout, _, code) = run_langid(&[
        "--model",
        path_str(&model),
        "detect",
        "-j",
        "-f",
        path_str(&en),
        "-f",
        path_str(&ru),
    ]);
    assert_eq!(code, 0);

    let value: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON");
    let results = value.as_array().expect("array for multiple inputs");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["language"], "EN");
    assert_eq!(results[1]["language"], "RU");
}

#[test]
fn test_detect_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_model(&dir);
    let missing = dir.path().join("missing.txt");

    let (_, stderr, code) = run_langid(&[
        "--model",
        path_str(&model),
        "detect",
        "-f",
        path_str(&missing),
    ]);
    assert_ne!(code, 0);
    assert!(stderr.contains("File not found"), "{stderr}");
}

#[test]
fn test_detect_interactive_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_model(&dir);

    let mut child = Command::new(binary_path())
        .args(["--model", path_str(&model), "detect"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn langid");
    child
        .stdin
        .take()
        .unwrap()
        .write_all("Hello world\n\nquit\nПривет мир\n".as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("EN ("), "{stdout}");
    // Lines after quit are not processed
    assert!(!stdout.contains("RU ("), "{stdout}");
}

#[test]
fn test_languages() {
    let dir = tempfile::tempdir().unwrap();
    let model = train_model(&dir);

    let (stdout, _, code) = run_langid(&["--model", path_str(&model), "languages"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "EN KK RU");

    let (stdout, _, code) = run_langid(&["--model", path_str(&model), "languages", "--json"]);
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(value["languages"], serde_json::json!(["EN", "KK", "RU"]));
}

#[test]
fn test_missing_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    let (_, stderr, code) = run_langid(&["--model", path_str(&missing), "detect", "hi"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("not found"), "{stderr}");
}

#[test]
fn test_corrupt_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"format_version": 1, "labels": []}"#).unwrap();

    let (_, stderr, code) = run_langid(&["--model", path_str(&bad), "languages"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Corrupt model artifact"), "{stderr}");
}

#[test]
fn test_train_rejects_bad_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("bad.tsv");
    std::fs::write(&corpus, "EN no tab here\n").unwrap();

    let (_, stderr, code) = run_langid(&[
        "train",
        "--corpus",
        path_str(&corpus),
        "--output",
        path_str(&dir.path().join("out.json")),
    ]);
    assert_ne!(code, 0);
    assert!(stderr.contains("LABEL<TAB>TEXT"), "{stderr}");
}
