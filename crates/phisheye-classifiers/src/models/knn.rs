use std::fmt;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics::distance::euclidian::Euclidian;
use smartcore::neighbors::knn_classifier::{KNNClassifier as SmartKnn, KNNClassifierParameters};

use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{
    check_fit_input, check_predict_input, not_fitted, to_dense, ClassifierModel,
};

type SmartEuclideanKnn = SmartKnn<f64, usize, DenseMatrix<f64>, Vec<usize>, Euclidian<f64>>;

/// k-nearest-neighbours with uniform weights and Euclidean distance.
///
/// The smartcore classifier reports the majority label only, which is
/// also returned as the class-1 score.
#[derive(Serialize, Deserialize)]
pub struct KNNClassifier {
    n_neighbors: usize,
    model: Option<SmartEuclideanKnn>,
    n_features: usize,
}

impl fmt::Debug for KNNClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KNNClassifier")
            .field("n_neighbors", &self.n_neighbors)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl KNNClassifier {
    pub fn new(n_neighbors: usize) -> Self {
        KNNClassifier {
            n_neighbors,
            model: None,
            n_features: 0,
        }
    }
}

impl ClassifierModel for KNNClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        check_fit_input(self.name(), x, y)?;
        if self.n_neighbors == 0 {
            return Err(PipelineError::model_fit(
                self.name(),
                "n_neighbors must be at least 1",
            ));
        }
        if self.n_neighbors > x.nrows() {
            return Err(PipelineError::model_fit(
                self.name(),
                format!(
                    "Expected n_neighbors <= n_samples, but n_samples = {}, n_neighbors = {}",
                    x.nrows(),
                    self.n_neighbors
                ),
            ));
        }

        let params = KNNClassifierParameters::default().with_k(self.n_neighbors);
        let model = SmartEuclideanKnn::fit(&to_dense(x), &y.to_vec(), params)
            .map_err(|e| PipelineError::model_fit(self.name(), e.to_string()))?;
        self.model = Some(model);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let model = self.model.as_ref().ok_or_else(|| not_fitted(self.name()))?;
        check_predict_input(self.name(), x, self.n_features)?;
        model
            .predict(&to_dense(x))
            .map_err(|e| PipelineError::model_fit(self.name(), e.to_string()))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        Ok(self.predict(x)?.into_iter().map(|l| l as f64).collect())
    }

    fn name(&self) -> &str {
        "K-Nearest Neighbors"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> (Array2<f64>, Vec<usize>) {
        let x = Array2::from_shape_vec((6, 1), vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]).unwrap();
        (x, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn majority_of_nearest_points_wins() {
        let (x, y) = line();
        let mut knn = KNNClassifier::new(3);
        knn.fit(&x, &y).unwrap();

        // 2.0, 1.0 and 10.0 are the closest to 5.0
        let query = Array2::from_shape_vec((3, 1), vec![0.5, 11.5, 5.0]).unwrap();
        assert_eq!(knn.predict(&query).unwrap(), vec![0, 1, 0]);
        assert_eq!(knn.predict_proba(&query).unwrap(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn zero_neighbours_is_a_fit_error() {
        let (x, y) = line();
        let mut knn = KNNClassifier::new(0);
        assert!(matches!(knn.fit(&x, &y), Err(PipelineError::ModelFit { .. })));
    }

    #[test]
    fn more_neighbours_than_samples_is_a_fit_error() {
        let (x, y) = line();
        let mut knn = KNNClassifier::new(7);
        assert!(matches!(knn.fit(&x, &y), Err(PipelineError::ModelFit { .. })));
    }

    #[test]
    fn unfitted_model_refuses_to_predict() {
        let (x, _) = line();
        assert!(KNNClassifier::new(3).predict(&x).is_err());
    }
}
