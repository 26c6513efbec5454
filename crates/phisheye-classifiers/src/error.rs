use std::error::Error;
use std::fmt;

/// Errors raised by the preparation, training and inference pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// A required configuration value is missing or invalid (e.g. unknown target column).
    Configuration(String),
    /// The data cannot be used as-is (empty after cleaning, non-binary target, ...).
    DataQuality(String),
    /// A single classifier failed to fit or predict.
    ModelFit { model: String, reason: String },
    /// ROC/AUC could not be computed for a single classifier.
    RocComputation { model: String, reason: String },
    /// No classifier in the registry trained successfully.
    NoSuccessfulModel { attempted: usize },
    /// A categorical value was not seen when the encoder was fitted.
    UnseenCategory {
        column: String,
        value: String,
        row: usize,
    },
    Io(std::io::Error),
    Csv(csv::Error),
    Serialization(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn model_fit(model: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::ModelFit {
            model: model.into(),
            reason: reason.into(),
        }
    }

    pub fn roc(model: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::RocComputation {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Errors the runner recovers from locally instead of aborting the run.
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            PipelineError::ModelFit { .. } | PipelineError::RocComputation { .. }
        )
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            PipelineError::DataQuality(msg) => write!(f, "Data quality error: {}", msg),
            PipelineError::ModelFit { model, reason } => {
                write!(f, "Failed to fit/predict with {}: {}", model, reason)
            }
            PipelineError::RocComputation { model, reason } => {
                write!(f, "Could not compute ROC curve for {}: {}", model, reason)
            }
            PipelineError::NoSuccessfulModel { attempted } => write!(
                f,
                "None of the {} classifiers trained successfully; no model to select",
                attempted
            ),
            PipelineError::UnseenCategory { column, value, row } => write!(
                f,
                "Unseen category '{}' in column '{}' at row {}",
                value, column, row
            ),
            PipelineError::Io(e) => write!(f, "I/O error: {}", e),
            PipelineError::Csv(e) => write!(f, "CSV error: {}", e),
            PipelineError::Serialization(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Io(e) => Some(e),
            PipelineError::Csv(e) => Some(e),
            PipelineError::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::Io(e)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(e: csv::Error) -> Self {
        PipelineError::Csv(e)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Serialization(e)
    }
}
