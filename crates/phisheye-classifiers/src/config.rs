use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PipelineError, Result};
use crate::preprocessing::{PrepareConfig, UnseenCategoryPolicy};

/// Default file name of the persisted model artifact.
pub const DEFAULT_ARTIFACT_FILE: &str = "phishing_detection_model.pkl";
/// Default file name of the prediction table written for unlabeled data.
pub const DEFAULT_PREDICTIONS_FILE: &str = "phishing_predictions.csv";

/// A named classifier configuration (one registry entry).
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub name: String,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Number of candidate features examined at each tree split.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Count(k) => *k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    RandomForest {
        n_estimators: usize,
        max_depth: Option<usize>,
        max_features: MaxFeatures,
        random_state: u64,
    },
    GBDT {
        num_boost_round: u32,
        learning_rate: f32,
        max_depth: u32,
        training_optimization_level: u8,
        loss_type: String,
    },
    SVM {
        c: f64,
        kernel: String,
        probability: bool,
        eps: f64,
    },
    KNearestNeighbors {
        n_neighbors: usize,
    },
    LogisticRegression {
        c: f64,
    },
    DecisionTree {
        max_depth: Option<usize>,
        min_samples_split: usize,
    },
    NaiveBayes {
        var_smoothing: f64,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::random_forest()
    }
}

impl ModelType {
    pub fn random_forest() -> Self {
        ModelType::RandomForest {
            n_estimators: 100,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            random_state: 42,
        }
    }

    pub fn gbdt() -> Self {
        ModelType::GBDT {
            num_boost_round: 100,
            learning_rate: 0.1,
            max_depth: 3,
            training_optimization_level: 2,
            loss_type: "LogLikelyhood".to_string(),
        }
    }

    pub fn svm() -> Self {
        ModelType::SVM {
            c: 1.0,
            kernel: "linear".to_string(),
            probability: true,
            eps: 1e-3,
        }
    }

    pub fn knn() -> Self {
        ModelType::KNearestNeighbors { n_neighbors: 5 }
    }

    pub fn logistic_regression() -> Self {
        ModelType::LogisticRegression { c: 1.0 }
    }

    pub fn decision_tree() -> Self {
        ModelType::DecisionTree {
            max_depth: None,
            min_samples_split: 2,
        }
    }

    pub fn naive_bayes() -> Self {
        ModelType::NaiveBayes {
            var_smoothing: 1e-9,
        }
    }

    /// Human readable name used in the comparison table.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelType::RandomForest { .. } => "Random Forest",
            ModelType::GBDT { .. } => "Gradient Boosting",
            ModelType::SVM { .. } => "Support Vector Machine",
            ModelType::KNearestNeighbors { .. } => "K-Nearest Neighbors",
            ModelType::LogisticRegression { .. } => "Logistic Regression",
            ModelType::DecisionTree { .. } => "Decision Tree",
            ModelType::NaiveBayes { .. } => "Naive Bayes",
        }
    }

    /// Short identifier accepted by `FromStr`.
    pub fn short_name(&self) -> &'static str {
        match self {
            ModelType::RandomForest { .. } => "random_forest",
            ModelType::GBDT { .. } => "gbdt",
            ModelType::SVM { .. } => "svm",
            ModelType::KNearestNeighbors { .. } => "knn",
            ModelType::LogisticRegression { .. } => "logistic_regression",
            ModelType::DecisionTree { .. } => "decision_tree",
            ModelType::NaiveBayes { .. } => "naive_bayes",
        }
    }

    /// Whether the configured model produces class probabilities, and so
    /// gets a ROC curve.
    pub fn supports_probability(&self) -> bool {
        match self {
            ModelType::SVM { probability, .. } => *probability,
            _ => true,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "random_forest" | "rf" => Ok(ModelType::random_forest()),
            "gbdt" | "gradient_boosting" => Ok(ModelType::gbdt()),
            "svm" => Ok(ModelType::svm()),
            "knn" | "k_nearest_neighbors" => Ok(ModelType::knn()),
            "logistic_regression" | "logreg" => Ok(ModelType::logistic_regression()),
            "decision_tree" | "tree" => Ok(ModelType::decision_tree()),
            "naive_bayes" | "gaussian_nb" => Ok(ModelType::naive_bayes()),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: random_forest, gbdt, svm, knn, \
                 logistic_regression, decision_tree, naive_bayes",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: name.into(),
            model_type,
        }
    }

    /// Entry named after the model type's display name.
    pub fn from_type(model_type: ModelType) -> Self {
        Self::new(model_type.display_name(), model_type)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::from_type(ModelType::default())
    }
}

/// Settings for applying a saved artifact to new data.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    pub data_path: PathBuf,
    pub has_target: bool,
    pub predictions_path: PathBuf,
    pub unseen_category_policy: UnseenCategoryPolicy,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        InferenceConfig {
            data_path: PathBuf::new(),
            has_target: false,
            predictions_path: PathBuf::from(DEFAULT_PREDICTIONS_FILE),
            unseen_category_policy: UnseenCategoryPolicy::default(),
        }
    }
}

/// Whole-run configuration, resolved before the pipeline starts.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_path: Option<PathBuf>,
    pub target_column: String,
    pub test_size: f64,
    pub random_state: u64,
    pub artifact_path: PathBuf,
    /// Optional CSV destination for the comparison table.
    pub metrics_path: Option<PathBuf>,
    pub classifiers: Vec<ModelConfig>,
    pub inference: Option<InferenceConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let prepare = PrepareConfig::default();
        PipelineConfig {
            data_path: None,
            target_column: prepare.target_column,
            test_size: prepare.test_size,
            random_state: prepare.random_state,
            artifact_path: PathBuf::from(DEFAULT_ARTIFACT_FILE),
            metrics_path: None,
            classifiers: crate::registry::ClassifierRegistry::default().into_entries(),
            inference: None,
        }
    }
}

impl PipelineConfig {
    pub fn prepare_config(&self) -> PrepareConfig {
        PrepareConfig {
            target_column: self.target_column.clone(),
            test_size: self.test_size,
            random_state: self.random_state,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "a target column name must be supplied".to_string(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::Configuration(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.classifiers.is_empty() {
            return Err(PipelineError::Configuration(
                "at least one classifier must be configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load a pipeline configuration from a JSON file.
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig> {
    let content = std::fs::read_to_string(&path)?;
    let config: PipelineConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
