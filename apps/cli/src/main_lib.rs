use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tickerwire_core::PipelineConfig;
use tickerwire_storage_sqlite::SqlitePipelineStore;

/// Installs the global subscriber: stdout plus an appending log file.
///
/// `TICKERWIRE_LOG_FORMAT=json` switches both outputs to JSON lines. Records
/// emitted through the `log` facade by the library crates are bridged in.
pub fn init_tracing(log_path: &Path) -> anyhow::Result<()> {
    let log_format =
        std::env::var("TICKERWIRE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(dir) = log_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let file_writer = Mutex::new(file);

    let registry = tracing_subscriber::registry().with(filter);
    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(file_writer),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true))
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(file_writer),
            )
            .try_init()?;
    }
    Ok(())
}

pub fn open_store(config: &PipelineConfig) -> anyhow::Result<Arc<SqlitePipelineStore>> {
    let store = SqlitePipelineStore::open(&config.database_path)?;
    tracing::info!("Database path in use: {}", config.database_path.display());
    Ok(Arc::new(store))
}
