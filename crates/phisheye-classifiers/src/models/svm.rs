use std::fmt;

use linfa::dataset::Pr;
use linfa::traits::Predict;
use linfa::Dataset;
use linfa_svm::{Svm, SvmParams};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{
    check_fit_input, check_predict_input, not_fitted, proba_to_class, ClassifierModel,
};

/// Linear support vector machine from linfa-svm.
///
/// The model is trained against probability targets, so linfa fits a Platt
/// sigmoid on top of the decision values. `predict` thresholds that
/// probability at 0.5; `predict_proba` is only offered when `probability`
/// is set.
#[derive(Serialize, Deserialize)]
pub struct SVMClassifier {
    c: f64,
    kernel: String,
    probability: bool,
    eps: f64,
    model: Option<Svm<f64, Pr>>,
    n_features: usize,
}

impl fmt::Debug for SVMClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SVMClassifier")
            .field("c", &self.c)
            .field("kernel", &self.kernel)
            .field("probability", &self.probability)
            .field("eps", &self.eps)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl SVMClassifier {
    pub fn new(c: f64, kernel: String, probability: bool, eps: f64) -> Self {
        SVMClassifier {
            c,
            kernel,
            probability,
            eps,
            model: None,
            n_features: 0,
        }
    }

    fn params(&self) -> Result<SvmParams<f64, Pr>> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("C must be positive, got {}", self.c),
            ));
        }
        if !(self.eps > 0.0 && self.eps.is_finite()) {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("eps must be positive, got {}", self.eps),
            ));
        }
        let params = Svm::<f64, Pr>::params()
            .eps(self.eps)
            .pos_neg_weights(self.c, self.c);
        match self.kernel.as_str() {
            "linear" => Ok(params.linear_kernel()),
            other => Err(PipelineError::model_fit(
                self.name(),
                format!("Unsupported kernel type: {}. Valid options are: linear", other),
            )),
        }
    }

    /// Platt-scaled probability of class 1 from the fitted model.
    fn platt_scores(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        check_predict_input(self.name(), x, self.n_features)?;
        let records = to_records(self.name(), x)?;
        let scores: ndarray::Array1<Pr> = model.predict(&records);
        Ok(scores.iter().map(|p| f64::from(**p)).collect())
    }
}

fn to_records(model: &str, x: &Array2<f64>) -> Result<ndarray::Array2<f64>> {
    ndarray::Array2::from_shape_vec((x.nrows(), x.ncols()), x.to_vec())
        .map_err(|e| PipelineError::model_fit(model, e.to_string()))
}

impl ClassifierModel for SVMClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        check_fit_input(self.name(), x, y)?;
        let params = self.params()?;

        let targets = ndarray::Array1::from_iter(y.iter().map(|&l| l == 1));
        let dataset = Dataset::new(to_records(self.name(), x)?, targets);
        let model = <SvmParams<f64, Pr> as linfa::traits::Fit<_, _, _>>::fit(&params, &dataset)
            .map_err(|e| PipelineError::model_fit(self.name(), e.to_string()))?;

        log::debug!("{} fitted on {} samples", self.name(), x.nrows());
        self.model = Some(model);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(proba_to_class(&self.platt_scores(x)?))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if !self.probability {
            return Err(PipelineError::model_fit(
                self.name(),
                "probability estimates are disabled (probability = false)",
            ));
        }
        self.platt_scores(x)
    }

    fn name(&self) -> &str {
        "Support Vector Machine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> (Array2<f64>, Vec<usize>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.1;
            data.extend_from_slice(&[-2.0 + jitter, -1.0 - jitter]);
            y.push(0);
            data.extend_from_slice(&[2.0 - jitter, 1.0 + jitter]);
            y.push(1);
        }
        (Array2::from_shape_vec((40, 2), data).unwrap(), y)
    }

    #[test]
    fn separates_linear_blobs() {
        let (x, y) = two_blobs();
        let mut svm = SVMClassifier::new(1.0, "linear".to_string(), true, 1e-3);
        svm.fit(&x, &y).unwrap();
        assert_eq!(svm.predict(&x).unwrap(), y);

        let proba = svm.predict_proba(&x).unwrap();
        for (p, label) in proba.iter().zip(&y) {
            if *label == 1 {
                assert!(*p > 0.5, "positive sample got {}", p);
            } else {
                assert!(*p < 0.5, "negative sample got {}", p);
            }
        }
    }

    #[test]
    fn non_positive_c_is_a_fit_error() {
        let (x, y) = two_blobs();
        let mut svm = SVMClassifier::new(-1.0, "linear".to_string(), true, 1e-3);
        assert!(matches!(svm.fit(&x, &y), Err(PipelineError::ModelFit { .. })));
    }

    #[test]
    fn unsupported_kernel_is_a_fit_error() {
        let (x, y) = two_blobs();
        let mut svm = SVMClassifier::new(1.0, "rbf".to_string(), true, 1e-3);
        assert!(matches!(svm.fit(&x, &y), Err(PipelineError::ModelFit { .. })));
    }

    #[test]
    fn proba_disabled_without_flag() {
        let (x, y) = two_blobs();
        let mut svm = SVMClassifier::new(1.0, "linear".to_string(), false, 1e-3);
        svm.fit(&x, &y).unwrap();
        assert!(svm.predict_proba(&x).is_err());
        assert_eq!(svm.predict(&x).unwrap().len(), 40);
    }
}
