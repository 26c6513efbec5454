//! The fixed, ordered set of classifiers compared by the runner.

use crate::config::{ModelConfig, ModelType};
use crate::models::factory::{build_model, Classifier};

/// Ordered list of classifier configurations.
///
/// Entries hold configuration only; every call to `build` returns a fresh,
/// unfitted model, so entries never share state.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierRegistry {
    entries: Vec<ModelConfig>,
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        ClassifierRegistry {
            entries: vec![
                ModelConfig::from_type(ModelType::random_forest()),
                ModelConfig::from_type(ModelType::gbdt()),
                ModelConfig::from_type(ModelType::svm()),
                ModelConfig::from_type(ModelType::knn()),
                ModelConfig::from_type(ModelType::logistic_regression()),
                ModelConfig::from_type(ModelType::decision_tree()),
                ModelConfig::from_type(ModelType::naive_bayes()),
            ],
        }
    }
}

impl ClassifierRegistry {
    pub fn new(entries: Vec<ModelConfig>) -> Self {
        ClassifierRegistry { entries }
    }

    /// Keep only the default entries whose short name is listed, in registry order.
    pub fn with_models(names: &[ModelType]) -> Self {
        let wanted: Vec<&str> = names.iter().map(ModelType::short_name).collect();
        let entries = ClassifierRegistry::default()
            .entries
            .into_iter()
            .filter(|e| wanted.contains(&e.model_type.short_name()))
            .collect();
        ClassifierRegistry { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelConfig> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn build(&self, entry: &ModelConfig) -> Classifier {
        build_model(entry)
    }

    pub fn into_entries(self) -> Vec<ModelConfig> {
        self.entries
    }
}
