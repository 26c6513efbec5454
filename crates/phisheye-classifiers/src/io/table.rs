//! CSV/TSV reader for the raw dataset and writer for prediction tables.
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::data_handling::{is_missing, RawDataset};
use crate::error::{PipelineError, Result};

/// Column header of the predictions file.
pub const PREDICTION_COLUMN: &str = "Prediction";

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Read a delimited file with a header row. `.tsv` files are tab separated,
/// everything else is comma separated.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<RawDataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        PipelineError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open dataset {}: {}", path.display(), e),
        ))
    })?;
    let dataset = read_dataset_from_reader(file, delimiter_for(path))?;
    log::debug!(
        "Read {} rows x {} columns from {}",
        dataset.nrows(),
        dataset.ncols(),
        path.display()
    );
    Ok(dataset)
}

/// Parse a dataset from any reader. Missing-value tokens become `None`.
pub fn read_dataset_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<RawDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(PipelineError::DataQuality("dataset has no header row".to_string()));
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = record
            .iter()
            .map(|cell| {
                if is_missing(cell) {
                    None
                } else {
                    Some(cell.trim().to_string())
                }
            })
            .collect();
        records.push(row);
    }
    Ok(RawDataset::new(headers, records))
}

/// Write one label per row under a single `Prediction` column.
pub fn write_predictions_csv<W: Write>(writer: W, labels: &[&str]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([PREDICTION_COLUMN])?;
    for label in labels {
        wtr.write_record([*label])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn na_tokens_become_missing() {
        let text = "url_length,has_ip,status\n10,yes,phish\n,no,legit\n12,NA,legit\n";
        let raw = read_dataset_from_reader(text.as_bytes(), b',').unwrap();
        assert_eq!(raw.headers, vec!["url_length", "has_ip", "status"]);
        assert_eq!(raw.nrows(), 3);
        assert_eq!(raw.records[0][1].as_deref(), Some("yes"));
        assert_eq!(raw.records[1][0], None);
        assert_eq!(raw.records[2][1], None);
    }

    #[test]
    fn tab_delimiter_by_extension() {
        assert_eq!(delimiter_for(Path::new("data.tsv")), b'\t');
        assert_eq!(delimiter_for(Path::new("data.csv")), b',');
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = "a,b\n1,2\n3\n";
        assert!(matches!(
            read_dataset_from_reader(text.as_bytes(), b','),
            Err(PipelineError::Csv(_))
        ));
    }

    #[test]
    fn predictions_have_single_column() {
        let mut buf = Vec::new();
        write_predictions_csv(&mut buf, &["Legitimate", "Phishing"]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Prediction\nLegitimate\nPhishing\n"
        );
    }
}
