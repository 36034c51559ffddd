//! Processed-data export: `{kind}_data_cleaned_{ts}.csv`.

use std::path::{Path, PathBuf};

use log::info;

use crate::errors::ReportError;
use crate::records::{write_dataset_csv, Dataset, DatasetKind, FetchTimestamp};

pub fn cleaned_export_path(dir: &Path, kind: DatasetKind, at: FetchTimestamp) -> PathBuf {
    dir.join(format!("{}_data_cleaned_{}.csv", kind, at.file_stamp()))
}

/// Writes a cleaned batch to the processed-data directory.
pub fn export_cleaned(
    dir: &Path,
    dataset: &Dataset,
    at: FetchTimestamp,
) -> Result<PathBuf, ReportError> {
    let path = cleaned_export_path(dir, dataset.kind(), at);
    write_dataset_csv(&path, dataset)?;
    info!("Processed {} data saved to {}", dataset.kind(), path.display());
    Ok(path)
}
