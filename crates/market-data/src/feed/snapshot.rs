//! Raw snapshot files.
//!
//! Each fetch writes its payload to `{kind}_data_{YYYYmmdd_HHMMSS}.json` before the
//! cleaner touches it. Snapshots are never overwritten: a second write for the same
//! kind and instant gets a numeric suffix.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::models::DatasetKind;

/// Timestamp format shared by every artifact file name.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

const MAX_SUFFIX: u32 = 1000;

/// Writes `payload` into `dir` and returns the path of the new file.
pub fn write_snapshot(
    dir: &Path,
    kind: DatasetKind,
    fetched_at: DateTime<Utc>,
    payload: &Value,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stem = format!("{}_data_{}", kind, fetched_at.format(FILE_TIMESTAMP_FORMAT));

    for attempt in 0..MAX_SUFFIX {
        let path = if attempt == 0 {
            dir.join(format!("{}.json", stem))
        } else {
            dir.join(format!("{}_{}.json", stem, attempt))
        };

        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        };

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, payload)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        return Ok(path);
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("too many snapshots named {}", stem),
    ))
}
