mod common;

use phisheye_classifiers::data_handling::RawDataset;
use phisheye_classifiers::preprocessing::{prepare, PrepareConfig};
use phisheye_classifiers::PipelineError;

#[test]
fn categorical_columns_are_integer_coded_and_split_70_30() {
    common::init_logging();
    let raw = common::phishing_dataset(100);
    let data = prepare(&raw, &PrepareConfig::default()).unwrap();

    assert_eq!(data.feature_names, vec!["url_length", "has_ip"]);
    assert_eq!(data.x_train.nrows(), 70);
    assert_eq!(data.x_test.nrows(), 30);
    assert_eq!(data.y_train.len() + data.y_test.len(), 100);
    assert_eq!(data.dropped_rows, 0);

    let has_ip = &data.encoders["has_ip"];
    assert_eq!(has_ip.classes(), ["no", "yes"]);
    assert!(!data.encoders.contains_key("url_length"));
    assert_eq!(data.target_encoder.classes(), ["legit", "phish"]);
}

#[test]
fn scaler_is_fitted_on_training_rows_only() {
    let raw = common::phishing_dataset(100);
    let data = prepare(&raw, &PrepareConfig::default()).unwrap();

    assert_eq!(data.scaler.n_samples, 70);
    let lengths: Vec<f64> = data
        .train_indices
        .iter()
        .map(|&i| raw.records[i][0].as_deref().unwrap().parse::<f64>().unwrap())
        .collect();
    let mean = lengths.iter().sum::<f64>() / lengths.len() as f64;
    let var = lengths.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / lengths.len() as f64;
    assert!((data.scaler.mean[0] - mean).abs() < 1e-9);
    assert!((data.scaler.std[0] - var.sqrt()).abs() < 1e-9);

    // standardised training column has zero mean
    let train_mean = data.x_train.column(0).iter().sum::<f64>() / 70.0;
    assert!(train_mean.abs() < 1e-9);
}

#[test]
fn same_seed_gives_same_membership() {
    let raw = common::phishing_dataset(60);
    let a = prepare(&raw, &PrepareConfig::default()).unwrap();
    let b = prepare(&raw, &PrepareConfig::default()).unwrap();
    assert_eq!(a.train_indices, b.train_indices);
    assert_eq!(a.test_indices, b.test_indices);
    assert_eq!(a.x_test, b.x_test);

    let other = PrepareConfig {
        random_state: 7,
        ..PrepareConfig::default()
    };
    let c = prepare(&raw, &other).unwrap();
    assert_ne!(a.test_indices, c.test_indices);
}

#[test]
fn rows_with_missing_values_are_dropped() {
    let mut rows: Vec<Vec<String>> = (0..20).map(common::row).collect();
    rows[3][0] = "NaN".to_string();
    rows[8][1] = String::new();
    let raw = RawDataset::from_string_rows(common::headers(), rows);

    let data = prepare(&raw, &PrepareConfig::default()).unwrap();
    assert_eq!(data.dropped_rows, 2);
    assert_eq!(data.x_train.nrows() + data.x_test.nrows(), 18);
    assert_eq!(data.x_test.nrows(), 6);
}

#[test]
fn unknown_target_column_is_a_configuration_error() {
    let raw = common::phishing_dataset(20);
    let config = PrepareConfig {
        target_column: "label".to_string(),
        ..PrepareConfig::default()
    };
    match prepare(&raw, &config) {
        Err(PipelineError::Configuration(msg)) => {
            assert!(msg.contains("label"));
            assert!(msg.contains("url_length"));
        }
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn non_binary_target_is_rejected() {
    let rows = vec![
        vec!["1".to_string(), "a".to_string()],
        vec!["2".to_string(), "b".to_string()],
        vec!["3".to_string(), "c".to_string()],
        vec!["4".to_string(), "a".to_string()],
    ];
    let raw = RawDataset::from_string_rows(vec!["x".into(), "status".into()], rows);
    assert!(matches!(
        prepare(&raw, &PrepareConfig::default()),
        Err(PipelineError::DataQuality(_))
    ));
}

#[test]
fn numeric_target_maps_onto_itself() {
    let rows = (0..10)
        .map(|i| vec![i.to_string(), (i % 2).to_string()])
        .collect();
    let raw = RawDataset::from_string_rows(vec!["x".into(), "status".into()], rows);
    let data = prepare(&raw, &PrepareConfig::default()).unwrap();
    assert_eq!(data.target_encoder.encode("0"), Some(0));
    assert_eq!(data.target_encoder.encode("1"), Some(1));
}

#[test]
fn all_rows_missing_is_a_data_quality_error() {
    let rows = vec![vec!["NA".to_string(), "yes".to_string(), "phish".to_string()]];
    let raw = RawDataset::from_string_rows(common::headers(), rows);
    assert!(matches!(
        prepare(&raw, &PrepareConfig::default()),
        Err(PipelineError::DataQuality(_))
    ));
}
