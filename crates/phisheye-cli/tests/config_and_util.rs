use std::path::PathBuf;

use phisheye_classifiers::config::{
    load_pipeline_config, InferenceConfig, ModelConfig, ModelType, PipelineConfig,
};
use phisheye_classifiers::preprocessing::UnseenCategoryPolicy;
use phisheye_cli::classifiers::predict::PredictArgs;
use phisheye_cli::classifiers::train::restrict_classifiers;
use phisheye_cli::classifiers::util::{parse_model_list, validate_tsv_or_csv_file};

// ---------------------------------------------------------------------------
// validate_tsv_or_csv_file
// ---------------------------------------------------------------------------

#[test]
fn accepts_existing_csv_and_tsv() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["data.csv", "data.tsv", "DATA.CSV"] {
        let path = dir.path().join(name);
        std::fs::write(&path, "a,b\n1,2\n").unwrap();
        assert!(validate_tsv_or_csv_file(&path).is_ok(), "{}", name);
    }
}

#[test]
fn rejects_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.xlsx");
    std::fs::write(&path, "").unwrap();
    let err = validate_tsv_or_csv_file(&path).unwrap_err();
    assert!(err.to_string().contains(".tsv or .csv"));
}

#[test]
fn rejects_missing_file() {
    let err = validate_tsv_or_csv_file("/nonexistent/data.csv").unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

// ---------------------------------------------------------------------------
// --models
// ---------------------------------------------------------------------------

#[test]
fn parses_model_list_with_aliases_and_spaces() {
    let models = parse_model_list("rf, knn ,naive-bayes").unwrap();
    let names: Vec<&str> = models.iter().map(|m| m.short_name()).collect();
    assert_eq!(names, vec!["random_forest", "knn", "naive_bayes"]);
}

#[test]
fn empty_or_unknown_model_list_is_rejected() {
    assert!(parse_model_list(" , ").is_err());
    let err = parse_model_list("rf,xgboost").unwrap_err();
    assert!(err.to_string().contains("Unknown model type: xgboost"));
}

#[test]
fn restrict_keeps_configured_hyperparameters() {
    let configured = vec![
        ModelConfig::new("Tiny KNN", ModelType::KNearestNeighbors { n_neighbors: 3 }),
        ModelConfig::from_type(ModelType::decision_tree()),
    ];
    let requested = vec![ModelType::knn(), ModelType::naive_bayes()];
    let entries = restrict_classifiers(&configured, &requested);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], configured[0]);
    assert_eq!(entries[1].name, "Naive Bayes");
    assert_eq!(entries[1].model_type, ModelType::naive_bayes());
}

// ---------------------------------------------------------------------------
// Config files
// ---------------------------------------------------------------------------

#[test]
fn loads_partial_pipeline_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "data_path": "phishing.csv",
            "target_column": "label",
            "inference": { "data_path": "new.csv", "unseen_category_policy": "drop_record" }
        }"#,
    )
    .unwrap();

    let config = load_pipeline_config(&path).unwrap();
    assert_eq!(config.data_path, Some(PathBuf::from("phishing.csv")));
    assert_eq!(config.target_column, "label");
    assert_eq!(config.test_size, 0.3);
    assert_eq!(config.classifiers.len(), PipelineConfig::default().classifiers.len());

    let inference = config.inference.unwrap();
    assert_eq!(inference.data_path, PathBuf::from("new.csv"));
    assert!(!inference.has_target);
    assert_eq!(
        inference.unseen_category_policy,
        UnseenCategoryPolicy::DropRecord
    );
}

#[test]
fn predict_args_from_inference_section() {
    let inference = InferenceConfig {
        data_path: PathBuf::from("new.csv"),
        has_target: true,
        predictions_path: PathBuf::from("out.csv"),
        unseen_category_policy: UnseenCategoryPolicy::MapToUnknown,
    };
    let args = PredictArgs::from_config(PathBuf::from("model.pkl"), &inference);
    assert_eq!(args.model_path, PathBuf::from("model.pkl"));
    assert_eq!(args.data_path, PathBuf::from("new.csv"));
    assert!(args.has_target);
    assert_eq!(args.output_path, PathBuf::from("out.csv"));
    assert_eq!(
        args.unseen_category_policy,
        UnseenCategoryPolicy::MapToUnknown
    );
}
