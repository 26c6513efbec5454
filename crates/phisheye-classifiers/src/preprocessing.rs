//! Dataset preparation: cleaning, categorical encoding, train/test split
//! and feature standardisation.
//!
//! Encoders are fitted once on the training dataset and reused verbatim at
//! inference time. The scaler is fitted on the training split only; the test
//! split never contributes to its statistics.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::data_handling::{CleanDataset, ColumnKind, RawDataset};
use crate::error::{PipelineError, Result};
use crate::math::Array2;

/// Standard scaler (per-column mean / population std).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
    /// Number of rows the statistics were computed from.
    pub n_samples: usize,
}

/// Fit a `Scaler` from an `Array2<f64>` where rows are samples and
/// columns are features.
///
/// Columns with zero variance get a std of 1.0 so they transform to 0.
pub fn fit_scaler(x: &Array2<f64>) -> Result<Scaler> {
    let (nrows, ncols) = x.shape();
    if nrows == 0 || ncols == 0 {
        return Err(PipelineError::DataQuality(
            "cannot fit a scaler on an empty matrix".to_string(),
        ));
    }

    let mut mean = vec![0.0f64; ncols];
    for row in x.rows() {
        for (m, v) in mean.iter_mut().zip(row) {
            *m += v;
        }
    }
    let nrows_f = nrows as f64;
    for v in mean.iter_mut() {
        *v /= nrows_f;
    }

    let mut var = vec![0.0f64; ncols];
    for row in x.rows() {
        for c in 0..ncols {
            let d = row[c] - mean[c];
            var[c] += d * d;
        }
    }
    let std = var
        .into_iter()
        .map(|v| {
            let s = (v / nrows_f).sqrt();
            if s > 0.0 && s.is_finite() {
                s
            } else {
                1.0
            }
        })
        .collect();

    Ok(Scaler {
        mean,
        std,
        n_samples: nrows,
    })
}

impl Scaler {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Transform all rows and return a new matrix.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (nrows, ncols) = x.shape();
        if ncols != self.n_features() {
            return Err(PipelineError::Configuration(format!(
                "scaler was fitted on {} features but received {}",
                self.n_features(),
                ncols
            )));
        }
        let mut out = Vec::with_capacity(nrows * ncols);
        for row in x.rows() {
            for c in 0..ncols {
                out.push((row[c] - self.mean[c]) / self.std[c]);
            }
        }
        Array2::from_shape_vec((nrows, ncols), out)
            .map_err(|e| PipelineError::DataQuality(e.to_string()))
    }
}

/// What to do with a categorical value the encoder never saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnseenCategoryPolicy {
    /// Fail with `PipelineError::UnseenCategory`.
    #[default]
    Reject,
    /// Skip the whole record and report it.
    DropRecord,
    /// Encode as the reserved code `classes.len()`.
    MapToUnknown,
}

impl std::str::FromStr for UnseenCategoryPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(UnseenCategoryPolicy::Reject),
            "drop" | "drop_record" => Ok(UnseenCategoryPolicy::DropRecord),
            "unknown" | "map_to_unknown" => Ok(UnseenCategoryPolicy::MapToUnknown),
            _ => Err(format!(
                "Unknown unseen-category policy: {}. Valid options are: reject, drop, unknown",
                s
            )),
        }
    }
}

/// Fitted categorical → integer mapping. Codes are indices into the
/// lexicographically sorted class list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

/// Result of encoding a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    Code(usize),
    Unseen,
}

impl LabelEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        LabelEncoder {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn code(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Reserved code for `UnseenCategoryPolicy::MapToUnknown`.
    pub fn unknown_code(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, value: &str, policy: UnseenCategoryPolicy) -> Encoded {
        match self.code(value) {
            Some(code) => Encoded::Code(code),
            None if policy == UnseenCategoryPolicy::MapToUnknown => {
                Encoded::Code(self.unknown_code())
            }
            None => Encoded::Unseen,
        }
    }
}

/// Feature encoders keyed by column name.
pub type FeatureEncoders = BTreeMap<String, LabelEncoder>;

/// Binary encoder for the target column.
///
/// Numeric labels are ordered numerically, text labels lexicographically;
/// the first class is code 0 and the second is code 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetEncoder {
    classes: Vec<String>,
    kind: ColumnKind,
}

impl TargetEncoder {
    pub fn fit<'a, I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let values: Vec<&str> = values.into_iter().collect();
        let kind = ColumnKind::infer(values.iter().copied());

        let classes: Vec<String> = match kind {
            ColumnKind::Categorical => {
                let set: BTreeSet<&str> = values.iter().copied().collect();
                set.into_iter().map(str::to_string).collect()
            }
            ColumnKind::Numeric => {
                let mut parsed: Vec<(f64, &str)> = values
                    .iter()
                    .filter_map(|v| v.trim().parse::<f64>().ok().map(|p| (p, *v)))
                    .collect();
                parsed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                parsed.dedup_by(|a, b| a.0 == b.0);
                parsed.into_iter().map(|(_, v)| v.trim().to_string()).collect()
            }
        };

        match classes.len() {
            2 => Ok(TargetEncoder { classes, kind }),
            1 => Err(PipelineError::DataQuality(format!(
                "target column contains a single class ('{}'); need exactly two",
                classes[0]
            ))),
            n => Err(PipelineError::DataQuality(format!(
                "target column must be binary but has {} classes",
                n
            ))),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encode(&self, value: &str) -> Option<usize> {
        match self.kind {
            ColumnKind::Categorical => self.classes.iter().position(|c| c == value),
            ColumnKind::Numeric => {
                let v = value.trim().parse::<f64>().ok()?;
                self.classes
                    .iter()
                    .position(|c| c.parse::<f64>().map(|p| p == v).unwrap_or(false))
            }
        }
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// `(class, code)` pairs for reporting.
    pub fn mapping(&self) -> Vec<(String, usize)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(code, c)| (c.clone(), code))
            .collect()
    }
}

/// Encoded feature matrix together with the rows it was built from.
#[derive(Debug, Clone)]
pub struct EncodedFeatures {
    pub x: Array2<f64>,
    /// Indices (into the clean dataset) of the rows present in `x`.
    pub kept_rows: Vec<usize>,
    /// Clean-dataset rows skipped because of `UnseenCategoryPolicy::DropRecord`.
    pub dropped_rows: Vec<usize>,
}

/// Turn the named feature columns of `data` into a numeric matrix.
///
/// Columns with an encoder are label-encoded under `policy`; every other
/// column must parse as a number.
pub fn encode_features(
    data: &CleanDataset,
    feature_names: &[String],
    encoders: &FeatureEncoders,
    policy: UnseenCategoryPolicy,
) -> Result<EncodedFeatures> {
    let indices = feature_names
        .iter()
        .map(|name| {
            data.column_index(name).ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "feature column '{}' is missing from the dataset",
                    name
                ))
            })
        })
        .collect::<Result<Vec<usize>>>()?;

    let mut values = Vec::with_capacity(data.nrows() * feature_names.len());
    let mut kept_rows = Vec::with_capacity(data.nrows());
    let mut dropped_rows = Vec::new();

    'rows: for (row_idx, row) in data.rows.iter().enumerate() {
        let record = data.source_row(row_idx);
        let mut encoded_row = Vec::with_capacity(indices.len());
        for (name, &col) in feature_names.iter().zip(indices.iter()) {
            let cell = row[col].as_str();
            match encoders.get(name) {
                Some(encoder) => match encoder.encode(cell, policy) {
                    Encoded::Code(code) => encoded_row.push(code as f64),
                    Encoded::Unseen => match policy {
                        UnseenCategoryPolicy::DropRecord => {
                            log::warn!(
                                "Dropping row {}: unseen category '{}' in column '{}'",
                                record,
                                cell,
                                name
                            );
                            dropped_rows.push(row_idx);
                            continue 'rows;
                        }
                        _ => {
                            return Err(PipelineError::UnseenCategory {
                                column: name.clone(),
                                value: cell.to_string(),
                                row: record,
                            })
                        }
                    },
                },
                None => {
                    let v = cell.trim().parse::<f64>().map_err(|_| {
                        PipelineError::DataQuality(format!(
                            "column '{}' is numeric but row {} holds '{}'",
                            name, record, cell
                        ))
                    })?;
                    encoded_row.push(v);
                }
            }
        }
        values.extend(encoded_row);
        kept_rows.push(row_idx);
    }

    let x = Array2::from_shape_vec((kept_rows.len(), feature_names.len()), values)
        .map_err(|e| PipelineError::DataQuality(e.to_string()))?;
    Ok(EncodedFeatures {
        x,
        kept_rows,
        dropped_rows,
    })
}

/// Shuffle `0..n` with a fixed seed and cut it into (train, test) indices.
///
/// The test side gets `ceil(test_size * n)` rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::Configuration(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n_test = (test_size * n as f64).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PipelineError::DataQuality(format!(
            "cannot split {} samples with test_size {}: one side would be empty",
            n, test_size
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Settings for `prepare`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub target_column: String,
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        PrepareConfig {
            target_column: "status".to_string(),
            test_size: 0.3,
            random_state: 42,
        }
    }
}

/// Everything the runner and the packager need from preparation.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
    pub scaler: Scaler,
    pub encoders: FeatureEncoders,
    pub target_encoder: TargetEncoder,
    pub feature_names: Vec<String>,
    pub target_column: String,
    /// Row indices (into the cleaned dataset) of each split.
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub dropped_rows: usize,
}

/// Clean, encode, split and scale a raw dataset.
pub fn prepare(raw: &RawDataset, config: &PrepareConfig) -> Result<PreparedData> {
    log::info!(
        "Dataset: {} samples, {} columns",
        raw.nrows(),
        raw.ncols()
    );

    let missing = raw.missing_count();
    let (clean, dropped_rows) = raw.drop_missing();
    if dropped_rows > 0 {
        log::warn!(
            "Found {} missing values. Dropped {} rows with missing values; {} samples remain.",
            missing,
            dropped_rows,
            clean.nrows()
        );
    }
    if clean.nrows() == 0 {
        return Err(PipelineError::DataQuality(format!(
            "no samples left after dropping {} rows with missing values",
            dropped_rows
        )));
    }

    let target_idx = clean.column_index(&config.target_column).ok_or_else(|| {
        PipelineError::Configuration(format!(
            "target column '{}' not found; available columns: {}",
            config.target_column,
            clean.headers.join(", ")
        ))
    })?;

    let feature_names: Vec<String> = clean
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != target_idx)
        .map(|(_, h)| h.clone())
        .collect();
    if feature_names.is_empty() {
        return Err(PipelineError::Configuration(
            "dataset has no feature columns besides the target".to_string(),
        ));
    }

    let mut encoders = FeatureEncoders::new();
    for (idx, name) in clean.headers.iter().enumerate() {
        if idx == target_idx || clean.column_kind(idx) == ColumnKind::Numeric {
            continue;
        }
        log::info!("Encoding categorical column: {}", name);
        encoders.insert(name.clone(), LabelEncoder::fit(clean.column_values(idx)));
    }

    let encoded = encode_features(&clean, &feature_names, &encoders, UnseenCategoryPolicy::Reject)?;

    let target_encoder = TargetEncoder::fit(clean.column_values(target_idx))?;
    log::info!("Classes mapped to: {:?}", target_encoder.mapping());
    let y = clean
        .column_values(target_idx)
        .enumerate()
        .map(|(row, v)| {
            target_encoder.encode(v).ok_or_else(|| PipelineError::UnseenCategory {
                column: config.target_column.clone(),
                value: v.to_string(),
                row: clean.source_row(row),
            })
        })
        .collect::<Result<Vec<usize>>>()?;
    log::info!(
        "Target distribution: {} x {}, {} x {}",
        y.iter().filter(|&&v| v == 0).count(),
        target_encoder.classes()[0],
        y.iter().filter(|&&v| v == 1).count(),
        target_encoder.classes()[1]
    );

    let (train_indices, test_indices) =
        train_test_split(clean.nrows(), config.test_size, config.random_state)?;
    log::info!(
        "Training set size: {} samples, testing set size: {} samples",
        train_indices.len(),
        test_indices.len()
    );

    let x_train_raw = encoded.x.select_rows(&train_indices);
    let x_test_raw = encoded.x.select_rows(&test_indices);
    let y_train = train_indices.iter().map(|&i| y[i]).collect();
    let y_test = test_indices.iter().map(|&i| y[i]).collect();

    let scaler = fit_scaler(&x_train_raw)?;
    let x_train = scaler.transform(&x_train_raw)?;
    let x_test = scaler.transform(&x_test_raw)?;

    Ok(PreparedData {
        x_train,
        x_test,
        y_train,
        y_test,
        scaler,
        encoders,
        target_encoder,
        feature_names,
        target_column: config.target_column.clone(),
        train_indices,
        test_indices,
        dropped_rows,
    })
}
