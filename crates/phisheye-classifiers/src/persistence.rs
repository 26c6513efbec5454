//! Model artifact: the selected classifier bundled with everything needed
//! to reproduce its predictions on new data.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::factory::Classifier;
use crate::preprocessing::{FeatureEncoders, PreparedData, Scaler, TargetEncoder};
use crate::runner::ClassifierResult;

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: Classifier,
    pub model_name: String,
    /// Test-split accuracy the model was selected on.
    pub accuracy: f64,
    pub scaler: Scaler,
    pub encoders: FeatureEncoders,
    pub target_encoder: TargetEncoder,
    /// Training feature columns, in matrix order.
    pub feature_names: Vec<String>,
    pub target_column: String,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// Version of the crate that wrote the artifact.
    pub version: String,
}

impl ModelArtifact {
    /// Package the best result with the preparation state it was trained on.
    pub fn from_parts(best: ClassifierResult, data: &PreparedData) -> Self {
        ModelArtifact {
            accuracy: best.accuracy(),
            model: best.model,
            model_name: best.name,
            scaler: data.scaler.clone(),
            encoders: data.encoders.clone(),
            target_encoder: data.target_encoder.clone(),
            feature_names: data.feature_names.clone(),
            target_column: data.target_column.clone(),
            created_at: chrono::Local::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        log::info!("Model saved as '{}'", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let artifact: ModelArtifact = serde_json::from_reader(reader)?;
        if artifact.scaler.n_features() != artifact.feature_names.len() {
            return Err(PipelineError::DataQuality(format!(
                "artifact '{}' is inconsistent: scaler has {} features, schema has {}",
                path.display(),
                artifact.scaler.n_features(),
                artifact.feature_names.len()
            )));
        }
        log::info!(
            "Loaded {} (accuracy {:.4}) created {}",
            artifact.model_name,
            artifact.accuracy,
            artifact.created_at
        );
        Ok(artifact)
    }
}
