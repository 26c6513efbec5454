//! phisheye-classifiers: train, compare and persist classical classifiers
//! for phishing website detection.
//!
//! The pipeline runs strictly forward: a raw tabular dataset is cleaned,
//! encoded, split and scaled (`preprocessing`), every entry of the
//! `registry` is fitted and evaluated (`runner`), the most accurate model is
//! selected and bundled with its preprocessing state into a `ModelArtifact`
//! (`persistence`), which `inference` later applies to new data.
//!
//! All models are implemented natively except gradient boosting, which wraps
//! the `gbdt` crate.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod inference;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod preprocessing;
pub mod registry;
pub mod runner;

pub use error::{PipelineError, Result};

use data_handling::RawDataset;
use persistence::ModelArtifact;
use preprocessing::{prepare, PrepareConfig, PreparedData};
use registry::ClassifierRegistry;
use runner::{run_classifiers, ComparisonTable, Selection};

/// Everything produced by one training run.
#[derive(Debug)]
pub struct TrainingRun {
    pub data: PreparedData,
    pub table: ComparisonTable,
    pub selection: Selection,
}

impl TrainingRun {
    /// Consume the run and package the selected model.
    pub fn into_artifact(self) -> Result<ModelArtifact> {
        let best = self.table.into_best()?;
        Ok(ModelArtifact::from_parts(best, &self.data))
    }
}

/// Prepare `raw`, evaluate every registry entry and select the best model.
///
/// Fails with `NoSuccessfulModel` when every classifier failed.
pub fn train_and_select(
    raw: &RawDataset,
    prepare_config: &PrepareConfig,
    registry: &ClassifierRegistry,
) -> Result<TrainingRun> {
    let data = prepare(raw, prepare_config)?;
    let table = run_classifiers(registry, &data);
    let selection = table.select_best()?;
    log::info!(
        "Best model: {} with accuracy {:.4}",
        selection.name,
        selection.accuracy
    );
    Ok(TrainingRun {
        data,
        table,
        selection,
    })
}
