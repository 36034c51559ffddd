use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::DatasetKind;

/// What a single fetch produced.
///
/// The payload is the raw, untransformed JSON document exactly as it was written
/// to the snapshot file. When `used_fallback` is set the document was generated
/// locally and has the same shape a live response would have.
#[derive(Clone, Debug)]
pub struct FetchOutcome {
    pub kind: DatasetKind,
    pub payload: Value,
    pub used_fallback: bool,
    /// Source tag the cleaner stamps on every row of this batch.
    pub data_source: String,
    pub fetched_at: DateTime<Utc>,
    /// Where the raw snapshot landed, if writing it succeeded.
    pub snapshot_path: Option<PathBuf>,
}

impl FetchOutcome {
    /// Number of rows in the payload, using the same shape rules as the cleaner.
    pub fn row_count(&self) -> usize {
        match (&self.kind, &self.payload) {
            (_, Value::Array(rows)) => rows.len(),
            (DatasetKind::News, Value::Object(map)) => map
                .get("articles")
                .and_then(Value::as_array)
                .map(|a| a.len())
                .unwrap_or(1),
            (DatasetKind::Market, Value::Object(_)) => 1,
            _ => 0,
        }
    }
}
