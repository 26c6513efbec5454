use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::error::{PipelineError, Result};
use crate::math::Array2;

/// Contract shared by every classifier in the registry.
///
/// Labels are class codes `0` (legitimate) and `1` (phishing).
pub trait ClassifierModel {
    /// Fit the model on scaled features `x` and labels `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()>;

    /// Predict a class code per row.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>>;

    /// Probability of class `1` per row.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>>;

    /// Human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Common argument checks for `fit`.
pub(crate) fn check_fit_input(model: &str, x: &Array2<f64>, y: &[usize]) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(PipelineError::model_fit(model, "training matrix is empty"));
    }
    if x.nrows() != y.len() {
        return Err(PipelineError::model_fit(
            model,
            format!("{} rows but {} labels", x.nrows(), y.len()),
        ));
    }
    if let Some(bad) = y.iter().find(|&&label| label > 1) {
        return Err(PipelineError::model_fit(
            model,
            format!("labels must be 0 or 1, found {}", bad),
        ));
    }
    if x.as_slice().iter().any(|v| !v.is_finite()) {
        return Err(PipelineError::model_fit(model, "training matrix contains non-finite values"));
    }
    Ok(())
}

/// Common argument checks for `predict` / `predict_proba`.
pub(crate) fn check_predict_input(model: &str, x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(PipelineError::model_fit(
            model,
            format!("model expects {} features but got {}", n_features, x.ncols()),
        ));
    }
    Ok(())
}

/// Threshold probabilities at 0.5.
pub(crate) fn proba_to_class(p: &[f64]) -> Vec<usize> {
    p.iter().map(|&v| usize::from(v > 0.5)).collect()
}

pub(crate) fn not_fitted(model: &str) -> PipelineError {
    PipelineError::model_fit(model, "model has not been fitted")
}

/// Copy `x` into smartcore's dense matrix (both are row-major).
pub(crate) fn to_dense(x: &Array2<f64>) -> DenseMatrix<f64> {
    DenseMatrix::new(x.nrows(), x.ncols(), x.to_vec(), false)
}
