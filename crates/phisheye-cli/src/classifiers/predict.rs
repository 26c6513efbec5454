use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;

use phisheye_classifiers::config::{InferenceConfig, DEFAULT_PREDICTIONS_FILE};
use phisheye_classifiers::inference::{apply_artifact, InferenceOptions, InferenceOutcome};
use phisheye_classifiers::io::read_dataset;
use phisheye_classifiers::persistence::ModelArtifact;
use phisheye_classifiers::preprocessing::UnseenCategoryPolicy;

use crate::classifiers::util::validate_tsv_or_csv_file;

/// Resolved arguments of `phisheye predict`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictArgs {
    pub model_path: PathBuf,
    pub data_path: PathBuf,
    pub has_target: bool,
    pub output_path: PathBuf,
    pub unseen_category_policy: UnseenCategoryPolicy,
}

impl PredictArgs {
    pub fn from_arguments(matches: &ArgMatches) -> Result<Self> {
        let model_path = matches
            .get_one::<PathBuf>("model")
            .context("--model is required")?
            .clone();
        let data_path = matches
            .get_one::<PathBuf>("data")
            .context("--data is required")?
            .clone();
        let output_path = matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREDICTIONS_FILE));
        let unseen_category_policy = match matches.get_one::<String>("unseen") {
            Some(policy) => UnseenCategoryPolicy::from_str(policy).map_err(anyhow::Error::msg)?,
            None => UnseenCategoryPolicy::default(),
        };

        Ok(PredictArgs {
            model_path,
            data_path,
            has_target: matches.get_flag("has_target"),
            output_path,
            unseen_category_policy,
        })
    }

    /// Arguments for the `inference` section of a pipeline config.
    pub fn from_config(model_path: PathBuf, inference: &InferenceConfig) -> Self {
        PredictArgs {
            model_path,
            data_path: inference.data_path.clone(),
            has_target: inference.has_target,
            output_path: inference.predictions_path.clone(),
            unseen_category_policy: inference.unseen_category_policy,
        }
    }
}

/// Number of predictions echoed to stdout before the CSV is written.
const PREVIEW_ROWS: usize = 10;

/// Apply a saved model to new data. Labeled data gets a classification
/// report on stdout; unlabeled data gets a predictions CSV.
pub fn run_prediction(args: &PredictArgs) -> Result<InferenceOutcome> {
    validate_tsv_or_csv_file(&args.data_path)?;
    let artifact = ModelArtifact::load(&args.model_path)
        .with_context(|| format!("Failed to load model: {}", args.model_path.display()))?;
    let raw = read_dataset(&args.data_path)
        .with_context(|| format!("Failed to read dataset: {}", args.data_path.display()))?;

    let options = InferenceOptions {
        has_target: args.has_target,
        unseen_category_policy: args.unseen_category_policy,
    };
    let outcome = apply_artifact(&artifact, &raw, &options)?;

    match &outcome {
        InferenceOutcome::Evaluated(eval) => {
            println!("Accuracy on new data: {:.4}", eval.metrics.accuracy);
            println!("\nClassification Report:");
            println!("{}", eval.report);
            println!("Confusion Matrix:");
            println!("{}", eval.metrics.confusion);
        }
        InferenceOutcome::Predicted(predictions) => {
            println!("First predictions:");
            for (row, label) in predictions.labels().iter().take(PREVIEW_ROWS).enumerate() {
                let label = if label.is_empty() { "(not scored)" } else { label };
                println!("  {}: {}", row, label);
            }
            predictions.write_csv(&args.output_path).with_context(|| {
                format!("Failed to write predictions: {}", args.output_path.display())
            })?;
            println!(
                "Predictions saved to '{}' ({} rows, {} scored, {} phishing)",
                args.output_path.display(),
                predictions.codes.len(),
                predictions.scored().len(),
                predictions.phishing_count()
            );
        }
    }
    Ok(outcome)
}
