//! Canonical record types produced by the cleaner and persisted by the store.
//!
//! - [`records_model`] - `MarketRecord`, `NewsRecord` and the tagged [`Dataset`] batch
//! - [`records_csv`] - CSV output shared by the processed export and the reporter
//! - [`types`] - strong types shared by both datasets (`FetchTimestamp`)

pub mod records_csv;
pub mod records_model;
pub mod types;

pub use records_csv::write_dataset_csv;
pub use records_model::{
    Dataset, MarketRecord, NewsRecord, RecordFilter, MARKET_COLUMNS, NEWS_COLUMNS,
};
pub use types::FetchTimestamp;

pub use tickerwire_market_data::DatasetKind;
