pub mod decision_tree;
pub mod gbdt;
pub mod knn;
pub mod logistic;
pub mod naive_bayes;
pub mod random_forest;
pub mod svm;

pub mod classifier_trait;
pub mod factory;
