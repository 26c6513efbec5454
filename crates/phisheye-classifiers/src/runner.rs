use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::metrics::{roc_curve, ClassificationMetrics, RocCurve};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::Classifier;
use crate::preprocessing::PreparedData;
use crate::registry::ClassifierRegistry;

/// Outcome of one successfully evaluated registry entry.
#[derive(Debug)]
pub struct ClassifierResult {
    pub name: String,
    pub model: Classifier,
    pub metrics: ClassificationMetrics,
    /// `None` when the model has no probability output or the curve failed.
    pub roc: Option<RocCurve>,
}

impl ClassifierResult {
    pub fn accuracy(&self) -> f64 {
        self.metrics.accuracy
    }

    pub fn auc(&self) -> Option<f64> {
        self.roc.as_ref().map(|r| r.auc)
    }
}

/// A registry entry whose fit or predict failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFailure {
    pub name: String,
    pub error: String,
}

/// The best entry of a comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub name: String,
    pub accuracy: f64,
}

/// Results of a full registry run, in registry order.
#[derive(Debug, Default)]
pub struct ComparisonTable {
    pub results: Vec<ClassifierResult>,
    pub failures: Vec<ModelFailure>,
}

impl ComparisonTable {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn attempted(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    /// Index of the most accurate result; the first one wins a tie.
    pub fn best_index(&self) -> Option<usize> {
        self.results
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, r)| match best {
                Some((_, acc)) if r.accuracy() <= acc => best,
                _ => Some((i, r.accuracy())),
            })
            .map(|(i, _)| i)
    }

    /// Read-only selection of the best model.
    pub fn select_best(&self) -> Result<Selection> {
        let index = self.best_index().ok_or(PipelineError::NoSuccessfulModel {
            attempted: self.attempted(),
        })?;
        let best = &self.results[index];
        Ok(Selection {
            index,
            name: best.name.clone(),
            accuracy: best.accuracy(),
        })
    }

    /// Consume the table and hand back the best result.
    pub fn into_best(mut self) -> Result<ClassifierResult> {
        let selection = self.select_best()?;
        Ok(self.results.swap_remove(selection.index))
    }

    /// Write the table as CSV (`Model,Accuracy,Precision,Recall,F1 Score,AUC`).
    pub fn write_csv<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["Model", "Accuracy", "Precision", "Recall", "F1 Score", "AUC"])?;
        for r in &self.results {
            let m = &r.metrics;
            wtr.write_record([
                r.name.clone(),
                m.accuracy.to_string(),
                m.precision.to_string(),
                m.recall.to_string(),
                m.f1.to_string(),
                r.auc().map(|a| a.to_string()).unwrap_or_default(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl fmt::Display for ComparisonTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self
            .results
            .iter()
            .map(|r| r.name.len())
            .chain(std::iter::once("Model".len()))
            .max()
            .unwrap_or(5);
        writeln!(
            f,
            "{:<width$} | {:>8} | {:>9} | {:>8} | {:>8} | {:>8}",
            "Model",
            "Accuracy",
            "Precision",
            "Recall",
            "F1 Score",
            "AUC",
            width = width
        )?;
        writeln!(f, "{}", "-".repeat(width + 59))?;
        for r in &self.results {
            let m = &r.metrics;
            let auc = r.auc().map(|a| format!("{:.4}", a)).unwrap_or_else(|| "-".into());
            writeln!(
                f,
                "{:<width$} | {:>8.4} | {:>9.4} | {:>8.4} | {:>8.4} | {:>8}",
                r.name,
                m.accuracy,
                m.precision,
                m.recall,
                m.f1,
                auc,
                width = width
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "{:<width$} | failed: {}", failure.name, failure.error, width = width)?;
        }
        Ok(())
    }
}

/// Run `f`, turning a panic inside a model into a `ModelFit` error.
fn isolate<T>(model: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "model panicked".to_string());
            Err(PipelineError::model_fit(model, format!("panic: {}", reason)))
        }
    }
}

fn fit_and_predict(
    model: &mut Classifier,
    x_train: &Array2<f64>,
    y_train: &[usize],
    x_test: &Array2<f64>,
) -> Result<Vec<usize>> {
    model.fit(x_train, y_train)?;
    model.predict(x_test)
}

fn compute_roc(model: &Classifier, name: &str, data: &PreparedData) -> Result<RocCurve> {
    let scores = isolate(name, || model.predict_proba(&data.x_test))
        .map_err(|e| PipelineError::roc(name, e.to_string()))?;
    roc_curve(&data.y_test, &scores).map_err(|reason| PipelineError::roc(name, reason))
}

/// Train and evaluate every registry entry on the prepared split.
///
/// # Arguments
///
/// * `registry` - The classifier configurations, evaluated in order
/// * `data` - Scaled train/test split from `prepare`
///
/// # Returns
///
/// The comparison table. Entries that fail to fit or predict are recorded
/// as failures and do not stop the run.
pub fn run_classifiers(registry: &ClassifierRegistry, data: &PreparedData) -> ComparisonTable {
    let mut table = ComparisonTable::default();
    let class_names = data.target_encoder.classes().to_vec();

    for entry in registry.iter() {
        log::info!("Training {}...", entry.name);
        let mut model = registry.build(entry);

        let predictions = isolate(&entry.name, || {
            fit_and_predict(&mut model, &data.x_train, &data.y_train, &data.x_test)
        });
        let predictions = match predictions {
            Ok(p) => p,
            Err(e) => {
                log::warn!("{}", e);
                table.failures.push(ModelFailure {
                    name: entry.name.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let metrics = ClassificationMetrics::compute(&data.y_test, &predictions);
        log::info!("{} Accuracy: {:.4}", entry.name, metrics.accuracy);
        log::debug!(
            "{} classification report:\n{}",
            entry.name,
            metrics.report(Some(class_names.as_slice()))
        );
        log::debug!("{} confusion matrix:\n{}", entry.name, metrics.confusion);

        let roc = if entry.model_type.supports_probability() {
            match compute_roc(&model, &entry.name, data) {
                Ok(roc) => {
                    log::debug!("{} AUC: {:.4}", entry.name, roc.auc);
                    Some(roc)
                }
                Err(e) => {
                    log::warn!("{}", e);
                    None
                }
            }
        } else {
            None
        };

        table.results.push(ClassifierResult {
            name: entry.name.clone(),
            model,
            metrics,
            roc,
        });
    }

    if !table.failures.is_empty() {
        log::warn!(
            "{} of {} classifiers failed",
            table.failures.len(),
            table.attempted()
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ConfusionMatrix;
    use crate::models::knn::KNNClassifier;

    fn result(name: &str, accuracy: f64) -> ClassifierResult {
        ClassifierResult {
            name: name.to_string(),
            model: Classifier::KNearestNeighbors(KNNClassifier::new(1)),
            metrics: ClassificationMetrics {
                accuracy,
                precision: accuracy,
                recall: accuracy,
                f1: accuracy,
                confusion: ConfusionMatrix::from_predictions(&[0, 1], &[0, 1]),
            },
            roc: None,
        }
    }

    #[test]
    fn ties_go_to_the_first_entry() {
        let table = ComparisonTable {
            results: vec![result("a", 0.8), result("b", 0.9), result("c", 0.9)],
            failures: vec![],
        };
        let best = table.select_best().unwrap();
        assert_eq!(best.name, "b");
        assert_eq!(best.index, 1);
        assert_eq!(table.select_best().unwrap(), best);
    }

    #[test]
    fn zero_accuracy_still_selects_first() {
        let table = ComparisonTable {
            results: vec![result("a", 0.0), result("b", 0.0)],
            failures: vec![],
        };
        assert_eq!(table.select_best().unwrap().name, "a");
    }

    #[test]
    fn empty_table_has_no_best() {
        let table = ComparisonTable {
            results: vec![],
            failures: vec![ModelFailure {
                name: "x".into(),
                error: "boom".into(),
            }],
        };
        match table.select_best() {
            Err(PipelineError::NoSuccessfulModel { attempted }) => assert_eq!(attempted, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn panics_become_fit_errors() {
        let r: Result<()> = isolate("Boom", || panic!("exploded"));
        match r {
            Err(PipelineError::ModelFit { model, reason }) => {
                assert_eq!(model, "Boom");
                assert!(reason.contains("exploded"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn csv_has_header_and_blank_auc() {
        let table = ComparisonTable {
            results: vec![result("Naive Bayes", 0.5)],
            failures: vec![],
        };
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Model,Accuracy,Precision,Recall,F1 Score,AUC"));
        assert_eq!(lines.next(), Some("Naive Bayes,0.5,0.5,0.5,0.5,"));
    }
}
