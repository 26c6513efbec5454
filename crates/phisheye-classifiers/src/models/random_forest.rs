use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier as SmartForest, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::SplitCriterion;

use crate::config::MaxFeatures;
use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{
    check_fit_input, check_predict_input, not_fitted, proba_to_class, to_dense, ClassifierModel,
};

type Member = SmartForest<f64, usize, DenseMatrix<f64>, Vec<usize>>;

/// Random forest built from smartcore's bootstrapped, feature-subsampled trees.
///
/// smartcore forests only report the majority label, so every estimator is
/// kept as its own single-tree forest and the class-1 vote share is the
/// probability. Per-tree seeds are drawn from `random_state` before the
/// trees are grown in parallel, so the forest does not depend on thread
/// scheduling.
#[derive(Serialize, Deserialize)]
pub struct RandomForestClassifier {
    n_estimators: usize,
    max_depth: Option<usize>,
    max_features: MaxFeatures,
    random_state: u64,
    trees: Vec<Member>,
    n_features: usize,
}

impl fmt::Debug for RandomForestClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForestClassifier")
            .field("n_estimators", &self.n_estimators)
            .field("max_depth", &self.max_depth)
            .field("max_features", &self.max_features)
            .field("random_state", &self.random_state)
            .field("n_trees", &self.trees.len())
            .finish()
    }
}

impl RandomForestClassifier {
    pub fn new(
        n_estimators: usize,
        max_depth: Option<usize>,
        max_features: MaxFeatures,
        random_state: u64,
    ) -> Self {
        RandomForestClassifier {
            n_estimators,
            max_depth,
            max_features,
            random_state,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn parameters(&self, n_features: usize) -> Result<RandomForestClassifierParameters> {
        let mut params = RandomForestClassifierParameters::default()
            .with_criterion(SplitCriterion::Gini)
            .with_n_trees(1)
            .with_m(self.max_features.resolve(n_features));
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

impl ClassifierModel for RandomForestClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        check_fit_input(self.name(), x, y)?;
        if self.n_estimators == 0 {
            return Err(PipelineError::model_fit(
                self.name(),
                "n_estimators must be at least 1",
            ));
        }
        let params = self.parameters(x.ncols())?;

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let seeds: Vec<u64> = (0..self.n_estimators).map(|_| rng.gen()).collect();
        let (dense, labels) = (to_dense(x), y.to_vec());
        let name = self.name();

        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                Member::fit(&dense, &labels, params.clone().with_seed(seed))
                    .map_err(|e| PipelineError::model_fit(name, e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Random forest grew {} trees", trees.len());
        self.trees = trees;
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(proba_to_class(&self.predict_proba(x)?))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        if self.trees.is_empty() {
            return Err(not_fitted(self.name()));
        }
        check_predict_input(self.name(), x, self.n_features)?;

        let dense = to_dense(x);
        let mut votes = vec![0usize; x.nrows()];
        for tree in &self.trees {
            let labels = tree
                .predict(&dense)
                .map_err(|e| PipelineError::model_fit(self.name(), e.to_string()))?;
            for (v, label) in votes.iter_mut().zip(labels) {
                *v += label;
            }
        }
        let n_trees = self.trees.len() as f64;
        Ok(votes.into_iter().map(|v| v as f64 / n_trees).collect())
    }

    fn name(&self) -> &str {
        "Random Forest"
    }
}
