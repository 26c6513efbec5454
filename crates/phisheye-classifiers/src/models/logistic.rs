use std::fmt;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};

use crate::error::{PipelineError, Result};
use crate::math::{dot, sigmoid, Array2};
use crate::models::classifier_trait::{
    check_fit_input, check_predict_input, not_fitted, to_dense, ClassifierModel,
};

type SmartLogistic = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// L2-regularised logistic regression, fitted by smartcore's L-BFGS solver.
///
/// `c` is the inverse regularisation strength; smartcore takes `alpha = 1 / c`.
#[derive(Serialize, Deserialize)]
pub struct LogisticRegressionClassifier {
    c: f64,
    model: Option<SmartLogistic>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl fmt::Debug for LogisticRegressionClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogisticRegressionClassifier")
            .field("c", &self.c)
            .field("coefficients", &self.coefficients)
            .field("intercept", &self.intercept)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl LogisticRegressionClassifier {
    pub fn new(c: f64) -> Self {
        LogisticRegressionClassifier {
            c,
            model: None,
            coefficients: Vec::new(),
            intercept: 0.0,
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl ClassifierModel for LogisticRegressionClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        check_fit_input(self.name(), x, y)?;
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("C must be positive, got {}", self.c),
            ));
        }

        let labels: Vec<i32> = y.iter().map(|&l| l as i32).collect();
        let params = LogisticRegressionParameters::default().with_alpha(1.0 / self.c);
        let model = SmartLogistic::fit(&to_dense(x), &labels, params)
            .map_err(|e| PipelineError::model_fit(self.name(), e.to_string()))?;

        // Binary fits hold a single weight row, whatever its orientation.
        let coefficients: Vec<f64> = model.coefficients().iterator(0).copied().collect();
        if coefficients.len() != x.ncols() {
            return Err(PipelineError::model_fit(
                self.name(),
                format!(
                    "expected {} coefficients, solver returned {}",
                    x.ncols(),
                    coefficients.len()
                ),
            ));
        }
        self.intercept = model.intercept().iterator(0).copied().next().unwrap_or(0.0);
        self.coefficients = coefficients;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let model = self.model.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        check_predict_input(self.name(), x, self.coefficients.len())?;
        let labels = model
            .predict(&to_dense(x))
            .map_err(|e| PipelineError::model_fit(self.name(), e.to_string()))?;
        Ok(labels.into_iter().map(|l| usize::from(l == 1)).collect())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if self.model.is_none() {
            return Err(not_fitted(self.name()));
        }
        check_predict_input(self.name(), x, self.coefficients.len())?;
        Ok(x
            .rows()
            .map(|row| sigmoid(dot(&self.coefficients, row) + self.intercept))
            .collect())
    }

    fn name(&self) -> &str {
        "Logistic Regression"
    }
}
