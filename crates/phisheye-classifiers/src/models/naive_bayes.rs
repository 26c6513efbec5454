use std::fmt;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::naive_bayes::gaussian::GaussianNB;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{
    check_fit_input, check_predict_input, not_fitted, proba_to_class, to_dense, ClassifierModel,
};

type SmartGaussianNB = GaussianNB<f64, usize, DenseMatrix<f64>, Vec<usize>>;

/// Gaussian naive Bayes.
///
/// Class means, variances and priors come from smartcore. Posteriors are
/// evaluated here so that `var_smoothing` times the largest feature variance
/// can be added to every per-class variance.
#[derive(Serialize, Deserialize)]
pub struct NaiveBayesClassifier {
    var_smoothing: f64,
    model: Option<SmartGaussianNB>,
    epsilon: f64,
    n_features: usize,
}

impl fmt::Debug for NaiveBayesClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaiveBayesClassifier")
            .field("var_smoothing", &self.var_smoothing)
            .field("epsilon", &self.epsilon)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl NaiveBayesClassifier {
    pub fn new(var_smoothing: f64) -> Self {
        NaiveBayesClassifier {
            var_smoothing,
            model: None,
            epsilon: 0.0,
            n_features: 0,
        }
    }

    fn joint_log_likelihood(&self, mean: &[f64], var: &[f64], prior: f64, row: &[f64]) -> Result<f64> {
        let mut total = prior.ln();
        for ((&v, &mu), &sigma2) in row.iter().zip(mean).zip(var) {
            let normal = Normal::new(mu, (sigma2 + self.epsilon).sqrt())
                .map_err(|e| PipelineError::model_fit(self.name(), e.to_string()))?;
            total += normal.ln_pdf(v);
        }
        Ok(total)
    }
}

impl ClassifierModel for NaiveBayesClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        check_fit_input(self.name(), x, y)?;
        if !(self.var_smoothing >= 0.0 && self.var_smoothing.is_finite()) {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("var_smoothing must be non-negative, got {}", self.var_smoothing),
            ));
        }

        let model = SmartGaussianNB::fit(&to_dense(x), &y.to_vec(), Default::default())
            .map_err(|e| PipelineError::model_fit(self.name(), e.to_string()))?;

        let max_var = (0..x.ncols())
            .map(|j| x.column(j).population_variance())
            .fold(0.0, f64::max);
        self.epsilon = self.var_smoothing * max_var;
        if self.epsilon <= 0.0 {
            // constant features would give a zero standard deviation
            self.epsilon = f64::MIN_POSITIVE.sqrt();
        }

        if model.classes().len() < 2 {
            log::warn!("{} was fitted on a single class", self.name());
        }
        self.model = Some(model);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(proba_to_class(&self.predict_proba(x)?))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let model = self.model.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        check_predict_input(self.name(), x, self.n_features)?;

        let classes = model.classes();
        let (theta, var, priors) = (model.theta(), model.var(), model.class_priors());
        x.rows()
            .map(|row| {
                let mut jll = Vec::with_capacity(classes.len());
                for k in 0..classes.len() {
                    jll.push(self.joint_log_likelihood(&theta[k], &var[k], priors[k], row)?);
                }
                let max = jll.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let log_norm = max + jll.iter().map(|l| (l - max).exp()).sum::<f64>().ln();
                let positive = classes
                    .iter()
                    .position(|&c| c == 1)
                    .map_or(0.0, |k| (jll[k] - log_norm).exp());
                Ok(positive)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "Naive Bayes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separates_gaussian_clusters() {
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![0.0, 0.1, 0.2, -0.1, -0.1, 0.0, 5.0, 5.1, 5.2, 4.9, 4.9, 5.0],
        )
        .unwrap();
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut nb = NaiveBayesClassifier::new(1e-9);
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.predict(&x).unwrap(), y);

        let proba = nb.predict_proba(&x).unwrap();
        assert!(proba[0] < 1e-6);
        assert!(proba[5] > 1.0 - 1e-6);
    }

    #[test]
    fn constant_feature_within_a_class_is_smoothed() {
        // Second feature never varies among class 0 rows.
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![0.0, 1.0, 0.3, 1.0, -0.2, 1.0, 3.0, 0.0, 3.2, 1.0, 2.9, 0.0],
        )
        .unwrap();
        let y = vec![0, 0, 0, 1, 1, 1];
        let mut nb = NaiveBayesClassifier::new(1e-9);
        nb.fit(&x, &y).unwrap();
        let proba = nb.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| p.is_finite() && (0.0..=1.0).contains(p)));
        assert_eq!(nb.predict(&x).unwrap(), y);
    }

    #[test]
    fn negative_smoothing_is_rejected() {
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let mut nb = NaiveBayesClassifier::new(-1.0);
        assert!(matches!(nb.fit(&x, &[0, 1]), Err(PipelineError::ModelFit { .. })));
    }
}
