//! Apply a saved artifact to a new dataset.

use std::path::Path;

use crate::data_handling::RawDataset;
use crate::error::{PipelineError, Result};
use crate::io::write_predictions_csv;
use crate::metrics::ClassificationMetrics;
use crate::models::classifier_trait::ClassifierModel;
use crate::persistence::ModelArtifact;
use crate::preprocessing::{encode_features, UnseenCategoryPolicy};

/// Display labels for class codes 0 and 1.
pub const PREDICTION_LABELS: [&str; 2] = ["Legitimate", "Phishing"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InferenceOptions {
    /// The new data carries the training target column.
    pub has_target: bool,
    pub unseen_category_policy: UnseenCategoryPolicy,
}

/// Predictions for new data, one entry per input record.
#[derive(Debug, Clone, PartialEq)]
pub struct Predictions {
    /// Class code per record; `None` where the record could not be scored.
    pub codes: Vec<Option<usize>>,
    /// Records dropped for missing values.
    pub dropped_missing: Vec<usize>,
    /// Records dropped under `UnseenCategoryPolicy::DropRecord`.
    pub dropped_unseen: Vec<usize>,
}

impl Predictions {
    /// One label per input record. Unscored records get an empty label so
    /// the output stays aligned with the input file.
    pub fn labels(&self) -> Vec<&'static str> {
        self.codes
            .iter()
            .map(|&c| c.map_or("", prediction_label))
            .collect()
    }

    /// Codes of the scored records, in record order.
    pub fn scored(&self) -> Vec<usize> {
        self.codes.iter().flatten().copied().collect()
    }

    pub fn phishing_count(&self) -> usize {
        self.codes.iter().filter(|&&c| c == Some(1)).count()
    }

    /// Write the `Prediction` column to `path`.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        write_predictions_csv(file, &self.labels())?;
        log::info!("Predictions saved to '{}'", path.as_ref().display());
        Ok(())
    }
}

/// Metrics for labeled data, plus the predictions they were computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub metrics: ClassificationMetrics,
    pub predictions: Predictions,
    /// sklearn-style report labelled with the training class names.
    pub report: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutcome {
    Evaluated(Evaluation),
    Predicted(Predictions),
}

pub fn prediction_label(code: usize) -> &'static str {
    PREDICTION_LABELS.get(code).copied().unwrap_or("Unknown")
}

/// Encode, scale and score `raw` with the artifact's model.
///
/// # Arguments
///
/// * `artifact` - Model and preparation state saved after training
/// * `raw` - New dataset; columns are matched to the training schema by name
/// * `options` - Whether `raw` holds the target, and how to treat unseen categories
pub fn apply_artifact(
    artifact: &ModelArtifact,
    raw: &RawDataset,
    options: &InferenceOptions,
) -> Result<InferenceOutcome> {
    let (clean, dropped_missing) = raw.drop_missing();
    if dropped_missing > 0 {
        log::warn!(
            "{} rows with missing values in the new data will not be scored",
            dropped_missing
        );
    }

    let target_idx = if options.has_target {
        Some(clean.column_index(&artifact.target_column).ok_or_else(|| {
            PipelineError::Configuration(format!(
                "target column '{}' not found in the new data; available columns: {}",
                artifact.target_column,
                clean.headers.join(", ")
            ))
        })?)
    } else {
        None
    };

    let encoded = encode_features(
        &clean,
        &artifact.feature_names,
        &artifact.encoders,
        options.unseen_category_policy,
    )?;
    if !encoded.dropped_rows.is_empty() {
        log::warn!(
            "Dropped {} rows with unseen categories",
            encoded.dropped_rows.len()
        );
    }
    if encoded.x.nrows() == 0 {
        return Err(PipelineError::DataQuality(
            "no rows left to score in the new data".to_string(),
        ));
    }

    let x = artifact.scaler.transform(&encoded.x)?;
    let scored = artifact.model.predict(&x)?;

    let mut codes = vec![None; raw.nrows()];
    for (&row, &code) in encoded.kept_rows.iter().zip(&scored) {
        codes[clean.source_row(row)] = Some(code);
    }
    let predictions = Predictions {
        codes,
        dropped_missing: clean.dropped_records(raw.nrows()),
        dropped_unseen: encoded
            .dropped_rows
            .iter()
            .map(|&row| clean.source_row(row))
            .collect(),
    };

    let Some(target_idx) = target_idx else {
        log::info!(
            "Scored {} of {} rows: {} predicted phishing",
            scored.len(),
            raw.nrows(),
            predictions.phishing_count()
        );
        return Ok(InferenceOutcome::Predicted(predictions));
    };

    let y_true = encoded
        .kept_rows
        .iter()
        .map(|&row| {
            let value = clean.rows[row][target_idx].as_str();
            artifact
                .target_encoder
                .encode(value)
                .ok_or_else(|| PipelineError::UnseenCategory {
                    column: artifact.target_column.clone(),
                    value: value.to_string(),
                    row: clean.source_row(row),
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    let metrics = ClassificationMetrics::compute(&y_true, &scored);
    let report = metrics.report(Some(artifact.target_encoder.classes()));
    log::info!("Accuracy on new data: {:.4}", metrics.accuracy);
    log::debug!("Classification report:\n{}", report);
    Ok(InferenceOutcome::Evaluated(Evaluation {
        metrics,
        predictions,
        report,
    }))
}
