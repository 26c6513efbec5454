use std::fmt;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier as SmartDecisionTree, DecisionTreeClassifierParameters, SplitCriterion,
};

use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{
    check_fit_input, check_predict_input, not_fitted, to_dense, ClassifierModel,
};

/// CART decision tree with Gini impurity.
///
/// smartcore trees expose labels only. Grown to purity, each leaf holds a
/// single class, so the predicted label doubles as the class-1 probability.
#[derive(Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    max_depth: Option<usize>,
    min_samples_split: usize,
    model: Option<SmartDecisionTree<f64, usize, DenseMatrix<f64>, Vec<usize>>>,
    n_features: usize,
}

impl fmt::Debug for DecisionTreeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionTreeClassifier")
            .field("max_depth", &self.max_depth)
            .field("min_samples_split", &self.min_samples_split)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl DecisionTreeClassifier {
    pub fn new(max_depth: Option<usize>, min_samples_split: usize) -> Self {
        DecisionTreeClassifier {
            max_depth,
            min_samples_split,
            model: None,
            n_features: 0,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn parameters(&self) -> Result<DecisionTreeClassifierParameters> {
        if self.min_samples_split < 2 {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("min_samples_split must be at least 2, got {}", self.min_samples_split),
            ));
        }
        let mut params = DecisionTreeClassifierParameters::default()
            .with_criterion(SplitCriterion::Gini)
            .with_min_samples_split(self.min_samples_split);
        if let Some(depth) = self.max_depth {
            let depth = u16::try_from(depth)
                .ok()
                .filter(|&d| d > 0)
                .ok_or_else(|| {
                    PipelineError::model_fit(
                        self.name(),
                        format!("max_depth must be in 1..={}, got {}", u16::MAX, depth),
                    )
                })?;
            params = params.with_max_depth(depth);
        }
        Ok(params)
    }
}

impl ClassifierModel for DecisionTreeClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        check_fit_input(self.name(), x, y)?;
        let params = self.parameters()?;
        let model = SmartDecisionTree::fit(&to_dense(x), &y.to_vec(), params)
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
        "Decision Tree"
    }
}
