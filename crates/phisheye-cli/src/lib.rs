//! phisheye-cli: argument handling and orchestration for the `phisheye`
//! binary. The pipeline itself lives in `phisheye-classifiers`.
pub mod classifiers;
