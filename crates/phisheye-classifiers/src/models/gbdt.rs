use std::fmt;

use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{
    check_fit_input, check_predict_input, proba_to_class, ClassifierModel,
};

/// Gradient Boosting Decision Tree (GBDT) classifier
///
/// The `LogLikelyhood` loss of the `gbdt` crate expects labels in {-1, 1}
/// and predicts the probability of label 1.
#[derive(Serialize, Deserialize)]
pub struct GBDTClassifier {
    num_boost_round: u32,
    learning_rate: f32,
    max_depth: u32,
    training_optimization_level: u8,
    loss_type: String,
    model: Option<GBDT>,
    n_features: usize,
}

impl fmt::Debug for GBDTClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GBDTClassifier")
            .field("num_boost_round", &self.num_boost_round)
            .field("learning_rate", &self.learning_rate)
            .field("max_depth", &self.max_depth)
            .field("loss_type", &self.loss_type)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl GBDTClassifier {
    pub fn new(
        num_boost_round: u32,
        learning_rate: f32,
        max_depth: u32,
        training_optimization_level: u8,
        loss_type: String,
    ) -> Self {
        GBDTClassifier {
            num_boost_round,
            learning_rate,
            max_depth,
            training_optimization_level,
            loss_type,
            model: None,
            n_features: 0,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.num_boost_round == 0 {
            return Err(PipelineError::model_fit(
                self.name(),
                "num_boost_round must be at least 1",
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(PipelineError::model_fit(
                self.name(),
                format!("learning_rate must be positive, got {}", self.learning_rate),
            ));
        }
        if self.max_depth == 0 {
            return Err(PipelineError::model_fit(self.name(), "max_depth must be >= 1"));
        }
        if self.loss_type != "LogLikelyhood" {
            return Err(PipelineError::model_fit(
                self.name(),
                format!(
                    "unsupported loss '{}'; only LogLikelyhood yields class probabilities",
                    self.loss_type
                ),
            ));
        }
        Ok(())
    }

    fn to_data_vec(x: &Array2<f64>, y: Option<&[usize]>) -> DataVec {
        let mut data = DataVec::new();
        for (i, row) in x.rows().enumerate() {
            let features = row.iter().map(|&v| v as f32).collect();
            let label = match y {
                Some(labels) if labels[i] == 1 => 1.0,
                Some(_) => -1.0,
                None => 0.0,
            };
            data.push(Data::new_training_data(features, 1.0, label, None));
        }
        data
    }
}

impl ClassifierModel for GBDTClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        check_fit_input(self.name(), x, y)?;
        self.validate()?;

        let mut config = Config::new();
        config.set_feature_size(x.ncols());
        config.set_shrinkage(self.learning_rate);
        config.set_max_depth(self.max_depth);
        config.set_iterations(self.num_boost_round as usize);
        config.set_debug(false);
        config.set_training_optimization_level(self.training_optimization_level);
        config.set_loss(&self.loss_type);

        let mut gbdt = GBDT::new(&config);
        let mut train_x = Self::to_data_vec(x, Some(y));
        gbdt.fit(&mut train_x);

        self.model = Some(gbdt);
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        Ok(proba_to_class(&self.predict_proba(x)?))
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| PipelineError::model_fit(self.name(), "model has not been fitted"))?;
        check_predict_input(self.name(), x, self.n_features)?;

        let test_x = Self::to_data_vec(x, None);
        let predictions = model.predict(&test_x);
        Ok(predictions
            .into_iter()
            .map(|p| (p as f64).clamp(0.0, 1.0))
            .collect())
    }

    fn name(&self) -> &str {
        "Gradient Boosting"
    }
}
