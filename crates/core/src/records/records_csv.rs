//! Tabular CSV output for record batches.

use std::fs;
use std::path::Path;

use super::Dataset;
use crate::errors::ReportError;

/// Writes `dataset` to `path` with a header row, creating parent directories.
///
/// An empty batch still produces a header-only file.
pub fn write_dataset_csv(path: &Path, dataset: &Dataset) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ReportError::Write {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let csv_error = |source| ReportError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(dataset.columns()).map_err(csv_error)?;
    for row in dataset.rows() {
        writer.write_record(&row).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ReportError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FetchTimestamp, NewsRecord};
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_write_news_csv_quotes_commas() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("news.csv");
        let at = FetchTimestamp::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        let dataset = Dataset::News(vec![NewsRecord {
            title: "Rates, again".to_string(),
            description: String::new(),
            author: String::new(),
            content: String::new(),
            source_id: "reuters".to_string(),
            source_name: "Reuters".to_string(),
            publishedat: String::new(),
            fetch_timestamp: at,
            data_source: "news_api".to_string(),
        }]);

        write_dataset_csv(&path, &dataset).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("title,description,author,content,source_id,source_name,publishedat,fetch_timestamp,data_source")
        );
        assert_eq!(
            lines.next(),
            Some("\"Rates, again\",,,,reuters,Reuters,,2024-01-02T03:04:05Z,news_api")
        );
    }
}
