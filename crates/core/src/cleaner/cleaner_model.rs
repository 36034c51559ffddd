//! Cleaner result models.

use std::fmt;

use serde::Serialize;

use crate::records::DatasetKind;

/// Why a row did not survive cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DataQualityIssue {
    /// An earlier row with the same natural key was replaced by a later one.
    Duplicate { key: String },
    /// Market `id` or news `title` was empty after cleaning.
    EmptyKey { row: usize },
    NegativePrice { key: String },
    NegativeMarketCap { key: String },
    /// A numeric column held something that is not a number.
    NonNumeric { row: usize, field: String },
}

impl DataQualityIssue {
    /// Duplicates are collapsed, everything else is an invalid row.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DataQualityIssue::Duplicate { .. })
    }
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityIssue::Duplicate { key } => write!(f, "duplicate key '{}'", key),
            DataQualityIssue::EmptyKey { row } => write!(f, "row {} has an empty key", row),
            DataQualityIssue::NegativePrice { key } => write!(f, "'{}' has a negative price", key),
            DataQualityIssue::NegativeMarketCap { key } => {
                write!(f, "'{}' has a negative market cap", key)
            }
            DataQualityIssue::NonNumeric { row, field } => {
                write!(f, "row {} has a non-numeric {}", row, field)
            }
        }
    }
}

/// Accounting for one cleaner pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanReport {
    pub dataset: DatasetKind,
    pub input_rows: usize,
    pub duplicates_removed: usize,
    pub invalid_dropped: usize,
    pub issues: Vec<DataQualityIssue>,
}

impl CleanReport {
    pub(crate) fn new(dataset: DatasetKind, input_rows: usize) -> Self {
        Self {
            dataset,
            input_rows,
            duplicates_removed: 0,
            invalid_dropped: 0,
            issues: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, issue: DataQualityIssue) {
        if issue.is_duplicate() {
            self.duplicates_removed += 1;
        } else {
            self.invalid_dropped += 1;
        }
        self.issues.push(issue);
    }

    pub fn dropped(&self) -> usize {
        self.duplicates_removed + self.invalid_dropped
    }

    pub fn kept(&self) -> usize {
        self.input_rows.saturating_sub(self.dropped())
    }
}
