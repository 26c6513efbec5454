//! CLI binary smoke tests using assert_cmd.
//!
//! These run the compiled `phisheye` binary end to end: argument parsing,
//! help text, a small training run and prediction on its artifact.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("phisheye").unwrap()
}

/// Synthetic table: long URLs and raw IP hosts are phishing.
fn write_dataset(path: &Path, n: usize, with_target: bool) {
    let mut text = if with_target {
        String::from("url_length,has_ip,status\n")
    } else {
        String::from("url_length,has_ip\n")
    };
    for i in 0..n {
        let url_length = 20 + (i * 37) % 80;
        let has_ip = if i % 4 == 0 { "yes" } else { "no" };
        if with_target {
            let status = if url_length > 60 || has_ip == "yes" {
                "phish"
            } else {
                "legit"
            };
            text.push_str(&format!("{},{},{}\n", url_length, has_ip, status));
        } else {
            text.push_str(&format!("{},{}\n", url_length, has_ip));
        }
    }
    std::fs::write(path, text).unwrap();
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_flag() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("predict"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("phisheye"));
}

// ---------------------------------------------------------------------------
// train
// ---------------------------------------------------------------------------

#[test]
fn train_without_data_prints_default_config_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(dir.path())
        .arg("train")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No config file provided"))
        .stderr(predicate::str::contains("\"classifiers\""))
        .stderr(predicate::str::contains("\"target_column\""));
}

#[test]
fn train_rejects_unknown_model_name() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("phishing.csv");
    write_dataset(&data, 40, true);
    cmd()
        .current_dir(dir.path())
        .args(["train", "--models", "xgboost", "-d"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown model type"));
}

#[test]
fn train_then_predict() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("phishing.csv");
    let new_data = dir.path().join("new.csv");
    let model = dir.path().join("model.pkl");
    let metrics = dir.path().join("metrics.csv");
    let predictions = dir.path().join("predictions.csv");
    write_dataset(&data, 100, true);
    write_dataset(&new_data, 12, false);

    cmd()
        .current_dir(dir.path())
        .args(["train", "--models", "decision_tree,naive_bayes", "-d"])
        .arg(&data)
        .arg("-o")
        .arg(&model)
        .arg("--metrics-out")
        .arg(&metrics)
        .assert()
        .success()
        .stdout(predicate::str::contains("Model Comparison"))
        .stdout(predicate::str::contains("Best model:"));
    assert!(model.exists());
    let table = std::fs::read_to_string(&metrics).unwrap();
    assert!(table.starts_with("Model,Accuracy,Precision,Recall,F1 Score,AUC"));

    cmd()
        .current_dir(dir.path())
        .arg("predict")
        .arg("-m")
        .arg(&model)
        .arg("-d")
        .arg(&new_data)
        .arg("-o")
        .arg(&predictions)
        .assert()
        .success()
        .stdout(predicate::str::contains("First predictions:"))
        .stdout(predicate::str::contains("  0: "))
        .stdout(predicate::str::contains("  9: "))
        .stdout(predicate::str::contains("  10: ").not());
    let written = std::fs::read_to_string(&predictions).unwrap();
    assert!(written.starts_with("Prediction\n"));
    assert_eq!(written.lines().count(), 13);

    cmd()
        .current_dir(dir.path())
        .arg("predict")
        .arg("--has-target")
        .arg("-m")
        .arg(&model)
        .arg("-d")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Classification Report"));
}

// ---------------------------------------------------------------------------
// predict / run
// ---------------------------------------------------------------------------

#[test]
fn predict_requires_model_and_data() {
    cmd().arg("predict").assert().failure();
}

#[test]
fn predict_with_missing_model_fails() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("new.csv");
    write_dataset(&data, 5, false);
    cmd()
        .args(["predict", "-m", "/nonexistent/model.pkl", "-d"])
        .arg(&data)
        .assert()
        .failure();
}

#[test]
fn run_nonexistent_config_errors() {
    cmd()
        .args(["run", "/nonexistent/config.json"])
        .assert()
        .failure();
}

#[test]
fn run_trains_and_applies_inference_section() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("phishing.csv");
    let new_data = dir.path().join("new.csv");
    write_dataset(&data, 80, true);
    write_dataset(&new_data, 6, false);
    // a seventh record with no url_length
    let mut text = std::fs::read_to_string(&new_data).unwrap();
    text.push_str(",no\n");
    std::fs::write(&new_data, text).unwrap();

    let config = serde_json::json!({
        "data_path": data,
        "artifact_path": dir.path().join("model.pkl"),
        "classifiers": [
            { "name": "Decision Tree", "DecisionTree": { "max_depth": null, "min_samples_split": 2 } }
        ],
        "inference": {
            "data_path": new_data,
            "predictions_path": dir.path().join("out.csv")
        }
    });
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    cmd()
        .current_dir(dir.path())
        .arg("run")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Decision Tree"))
        .stdout(predicate::str::contains("  6: (not scored)"));
    let out = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert_eq!(out.lines().count(), 8);
}
