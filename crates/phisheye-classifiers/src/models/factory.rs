use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::Result;
use crate::math::Array2;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::DecisionTreeClassifier;
use crate::models::gbdt::GBDTClassifier;
use crate::models::knn::KNNClassifier;
use crate::models::logistic::LogisticRegressionClassifier;
use crate::models::naive_bayes::NaiveBayesClassifier;
use crate::models::random_forest::RandomForestClassifier;
use crate::models::svm::SVMClassifier;

/// Any registry model, fitted or not. Serializable so the selected model can
/// be stored in the artifact.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state")]
pub enum Classifier {
    RandomForest(RandomForestClassifier),
    GBDT(GBDTClassifier),
    SVM(SVMClassifier),
    KNearestNeighbors(KNNClassifier),
    LogisticRegression(LogisticRegressionClassifier),
    DecisionTree(DecisionTreeClassifier),
    NaiveBayes(NaiveBayesClassifier),
}

impl Classifier {
    fn inner(&self) -> &dyn ClassifierModel {
        match self {
            Classifier::RandomForest(m) => m,
            Classifier::GBDT(m) => m,
            Classifier::SVM(m) => m,
            Classifier::KNearestNeighbors(m) => m,
            Classifier::LogisticRegression(m) => m,
            Classifier::DecisionTree(m) => m,
            Classifier::NaiveBayes(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ClassifierModel {
        match self {
            Classifier::RandomForest(m) => m,
            Classifier::GBDT(m) => m,
            Classifier::SVM(m) => m,
            Classifier::KNearestNeighbors(m) => m,
            Classifier::LogisticRegression(m) => m,
            Classifier::DecisionTree(m) => m,
            Classifier::NaiveBayes(m) => m,
        }
    }
}

impl ClassifierModel for Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        self.inner().predict(x)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        self.inner().predict_proba(x)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// Build a fresh, unfitted classifier from a `ModelConfig`.
pub fn build_model(params: &ModelConfig) -> Classifier {
    match params.model_type.clone() {
        ModelType::RandomForest {
            n_estimators,
            max_depth,
            max_features,
            random_state,
        } => Classifier::RandomForest(RandomForestClassifier::new(
            n_estimators,
            max_depth,
            max_features,
            random_state,
        )),
        ModelType::GBDT {
            num_boost_round,
            learning_rate,
            max_depth,
            training_optimization_level,
            loss_type,
        } => Classifier::GBDT(GBDTClassifier::new(
            num_boost_round,
            learning_rate,
            max_depth,
            training_optimization_level,
            loss_type,
        )),
        ModelType::SVM {
            c,
            kernel,
            probability,
            eps,
        } => Classifier::SVM(SVMClassifier::new(c, kernel, probability, eps)),
        ModelType::KNearestNeighbors { n_neighbors } => {
            Classifier::KNearestNeighbors(KNNClassifier::new(n_neighbors))
        }
        ModelType::LogisticRegression { c } => {
            Classifier::LogisticRegression(LogisticRegressionClassifier::new(c))
        }
        ModelType::DecisionTree {
            max_depth,
            min_samples_split,
        } => Classifier::DecisionTree(DecisionTreeClassifier::new(max_depth, min_samples_split)),
        ModelType::NaiveBayes { var_smoothing } => {
            Classifier::NaiveBayes(NaiveBayesClassifier::new(var_smoothing))
        }
    }
}
