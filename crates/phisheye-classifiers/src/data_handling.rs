//! Data structures for the raw tabular input.
//!
//! A `RawDataset` keeps every cell as text (or `None` when missing) so the
//! preparer can decide column kinds after cleaning. Helpers here handle
//! missing-value detection, row dropping and column typing.

/// Tokens treated as a missing value, matching common CSV exporters.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>",
    "#N/A", "#NA",
];

/// Returns true when a raw cell should be treated as missing.
pub fn is_missing(value: &str) -> bool {
    NA_TOKENS.contains(&value.trim())
}

/// Whether a column holds numbers or categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl ColumnKind {
    /// A column is numeric when every value parses as a float.
    pub fn infer<'a, I>(values: I) -> ColumnKind
    where
        I: IntoIterator<Item = &'a str>,
    {
        let all_numeric = values
            .into_iter()
            .all(|v| v.trim().parse::<f64>().is_ok());
        if all_numeric {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDataset {
    pub headers: Vec<String>,
    /// One entry per record; `None` marks a missing cell.
    pub records: Vec<Vec<Option<String>>>,
}

impl RawDataset {
    pub fn new(headers: Vec<String>, records: Vec<Vec<Option<String>>>) -> Self {
        RawDataset { headers, records }
    }

    /// Build from string rows, converting NA tokens to `None`.
    pub fn from_string_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let records = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| if is_missing(&cell) { None } else { Some(cell) })
                    .collect()
            })
            .collect();
        RawDataset { headers, records }
    }

    pub fn nrows(&self) -> usize {
        self.records.len()
    }

    pub fn ncols(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Total number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.iter().filter(|c| c.is_none()).count())
            .sum()
    }

    /// Drop every record containing a missing value (or a short row).
    ///
    /// Returns the cleaned rows and the number of records dropped.
    pub fn drop_missing(&self) -> (CleanDataset, usize) {
        let width = self.headers.len();
        let (source_rows, rows): (Vec<usize>, Vec<Vec<String>>) = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.len() == width && r.iter().all(|c| c.is_some()))
            .map(|(i, r)| (i, r.iter().flatten().cloned().collect()))
            .unzip();
        let dropped = self.records.len() - rows.len();
        (
            CleanDataset {
                headers: self.headers.clone(),
                rows,
                source_rows,
            },
            dropped,
        )
    }
}

/// A dataset without missing values; every row has one cell per header.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanDataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Index of each row's record in the source `RawDataset`, ascending.
    pub source_rows: Vec<usize>,
}

impl CleanDataset {
    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(move |r| r[idx].as_str())
    }

    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        ColumnKind::infer(self.column_values(idx))
    }

    /// Record index in the source data for clean row `row`.
    pub fn source_row(&self, row: usize) -> usize {
        self.source_rows[row]
    }

    /// Source records that did not survive cleaning, out of `n_records`.
    pub fn dropped_records(&self, n_records: usize) -> Vec<usize> {
        (0..n_records)
            .filter(|r| self.source_rows.binary_search(r).is_err())
            .collect()
    }
}
