use std::io::Write;

use phisheye_classifiers::config::{
    load_pipeline_config, MaxFeatures, ModelConfig, ModelType, PipelineConfig,
    DEFAULT_ARTIFACT_FILE,
};
use phisheye_classifiers::preprocessing::UnseenCategoryPolicy;
use phisheye_classifiers::registry::ClassifierRegistry;
use phisheye_classifiers::PipelineError;

#[test]
fn default_registry_order_is_fixed() {
    let registry = ClassifierRegistry::default();
    assert_eq!(
        registry.names(),
        vec![
            "Random Forest",
            "Gradient Boosting",
            "Support Vector Machine",
            "K-Nearest Neighbors",
            "Logistic Regression",
            "Decision Tree",
            "Naive Bayes",
        ]
    );
    assert!(registry.iter().all(|e| e.model_type.supports_probability()));
}

#[test]
fn with_models_keeps_registry_order() {
    let wanted: Vec<ModelType> = ["naive_bayes", "rf", "knn"]
        .iter()
        .map(|s| s.parse().unwrap())
        .collect();
    let registry = ClassifierRegistry::with_models(&wanted);
    assert_eq!(
        registry.names(),
        vec!["Random Forest", "K-Nearest Neighbors", "Naive Bayes"]
    );
}

#[test]
fn model_type_parsing() {
    assert_eq!("GBDT".parse::<ModelType>().unwrap(), ModelType::gbdt());
    assert_eq!(
        "logistic-regression".parse::<ModelType>().unwrap(),
        ModelType::logistic_regression()
    );
    assert!("xgboost".parse::<ModelType>().is_err());
}

#[test]
fn svm_probability_flag_controls_capability() {
    let mut svm = ModelType::svm();
    assert!(svm.supports_probability());
    if let ModelType::SVM { probability, .. } = &mut svm {
        *probability = false;
    }
    assert!(!svm.supports_probability());
}

#[test]
fn max_features_resolution() {
    assert_eq!(MaxFeatures::Sqrt.resolve(30), 5);
    assert_eq!(MaxFeatures::Log2.resolve(1), 1);
    assert_eq!(MaxFeatures::Count(50).resolve(10), 10);
    assert_eq!(MaxFeatures::All.resolve(7), 7);
}

#[test]
fn partial_config_file_falls_back_to_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "data_path": "phishing.csv",
            "test_size": 0.25,
            "classifiers": [
                {{ "name": "Tree", "DecisionTree": {{ "max_depth": 4, "min_samples_split": 2 }} }}
            ],
            "inference": {{ "data_path": "new.csv", "unseen_category_policy": "drop_record" }}
        }}"#
    )
    .unwrap();

    let config = load_pipeline_config(file.path()).unwrap();
    assert_eq!(config.target_column, "status");
    assert_eq!(config.test_size, 0.25);
    assert_eq!(config.random_state, 42);
    assert_eq!(config.artifact_path.to_str(), Some(DEFAULT_ARTIFACT_FILE));
    assert_eq!(config.classifiers.len(), 1);
    assert_eq!(config.classifiers[0].name, "Tree");

    let inference = config.inference.unwrap();
    assert!(!inference.has_target);
    assert_eq!(
        inference.unseen_category_policy,
        UnseenCategoryPolicy::DropRecord
    );
}

#[test]
fn config_round_trips_through_json() {
    let config = PipelineConfig::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    let back: PipelineConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
    assert_eq!(back.classifiers.len(), 7);
}

#[test]
fn invalid_config_values_are_rejected() {
    let mut config = PipelineConfig::default();
    config.test_size = 1.5;
    assert!(matches!(config.validate(), Err(PipelineError::Configuration(_))));

    let mut config = PipelineConfig::default();
    config.classifiers.clear();
    assert!(config.validate().is_err());

    let mut config = PipelineConfig::default();
    config.target_column = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn malformed_config_file_is_a_serialization_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();
    assert!(matches!(
        load_pipeline_config(file.path()),
        Err(PipelineError::Serialization(_))
    ));
}

#[test]
fn model_config_defaults_to_random_forest() {
    let entry = ModelConfig::default();
    assert_eq!(entry.name, "Random Forest");
    assert_eq!(entry.model_type, ModelType::random_forest());
}
