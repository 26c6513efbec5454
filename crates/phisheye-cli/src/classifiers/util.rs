use std::path::Path;
use std::str::FromStr;

use anyhow::Result;

use phisheye_classifiers::config::ModelType;

/// Check that `path` names an existing `.csv` or `.tsv` file.
pub fn validate_tsv_or_csv_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!(
            "File must have a .tsv or .csv extension: {}",
            path.display()
        ),
    }

    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    Ok(())
}

/// Parse a comma separated list of model short names (`rf,knn,naive_bayes`).
pub fn parse_model_list(list: &str) -> Result<Vec<ModelType>> {
    let models = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| ModelType::from_str(s).map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;
    if models.is_empty() {
        anyhow::bail!("--models needs at least one model name");
    }
    Ok(models)
}
