use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;

use phisheye_classifiers::config::{load_pipeline_config, ModelConfig, ModelType, PipelineConfig};
use phisheye_classifiers::io::read_dataset;
use phisheye_classifiers::registry::ClassifierRegistry;
use phisheye_classifiers::runner::{ComparisonTable, Selection};
use phisheye_classifiers::train_and_select;

use crate::classifiers::util::{parse_model_list, validate_tsv_or_csv_file};

/// What a training run left behind.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub selection: Selection,
    pub artifact_path: PathBuf,
    pub failures: usize,
}

/// Load the config file (or defaults) and apply `train` command line overrides.
pub fn resolve_train_config(
    config_path: Option<&PathBuf>,
    matches: &ArgMatches,
) -> Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => load_pipeline_config(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(data) = matches.get_one::<PathBuf>("data") {
        config.data_path = Some(data.clone());
    }
    if let Some(target) = matches.get_one::<String>("target") {
        config.target_column = target.clone();
    }
    if let Some(output) = matches.get_one::<PathBuf>("output") {
        config.artifact_path = output.clone();
    }
    if let Some(test_size) = matches.get_one::<f64>("test_size") {
        config.test_size = *test_size;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.random_state = *seed;
    }
    if let Some(metrics) = matches.get_one::<PathBuf>("metrics_out") {
        config.metrics_path = Some(metrics.clone());
    }
    if let Some(models) = matches.get_one::<String>("models") {
        config.classifiers = restrict_classifiers(&config.classifiers, &parse_model_list(models)?);
    }

    config.validate()?;
    Ok(config)
}

/// Keep the configured entries whose type was requested; requested types
/// with no configured entry get their default entry appended.
pub fn restrict_classifiers(configured: &[ModelConfig], requested: &[ModelType]) -> Vec<ModelConfig> {
    let wanted: Vec<&str> = requested.iter().map(|m| m.short_name()).collect();
    let mut entries: Vec<ModelConfig> = configured
        .iter()
        .filter(|e| wanted.contains(&e.model_type.short_name()))
        .cloned()
        .collect();
    for default in ClassifierRegistry::with_models(requested).into_entries() {
        let short = default.model_type.short_name();
        if !entries.iter().any(|e| e.model_type.short_name() == short) {
            entries.push(default);
        }
    }
    entries
}

/// Train every configured classifier, print the comparison table and save
/// the best model.
pub fn run_training(config: &PipelineConfig) -> Result<TrainingSummary> {
    let data_path = config
        .data_path
        .as_ref()
        .context("No training data given: pass --data or set \"data_path\" in the config")?;
    validate_tsv_or_csv_file(data_path)?;

    log::info!("Loading dataset from {}", data_path.display());
    let raw = read_dataset(data_path)
        .with_context(|| format!("Failed to read dataset: {}", data_path.display()))?;

    let registry = ClassifierRegistry::new(config.classifiers.clone());
    let run = train_and_select(&raw, &config.prepare_config(), &registry)?;

    println!("Model Comparison:");
    println!("{}", run.table);

    if let Some(path) = &config.metrics_path {
        write_metrics(path, &run.table)?;
    }

    let selection = run.selection.clone();
    let failures = run.table.failures.len();
    let artifact = run.into_artifact()?;
    artifact
        .save(&config.artifact_path)
        .with_context(|| format!("Failed to save model: {}", config.artifact_path.display()))?;

    println!(
        "Best model: {} with accuracy {:.4}",
        selection.name, selection.accuracy
    );

    Ok(TrainingSummary {
        selection,
        artifact_path: config.artifact_path.clone(),
        failures,
    })
}

fn write_metrics(path: &Path, table: &ComparisonTable) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create metrics file: {}", path.display()))?;
    table.write_csv(file)?;
    log::info!("Comparison table written to {}", path.display());
    Ok(())
}
