//! Tickerwire Core - records, cleaning, reporting and run orchestration.
//!
//! This crate contains the pipeline's domain logic. It is database-agnostic and
//! defines the [`store::PipelineStore`] trait implemented by the `storage-sqlite`
//! crate, and the [`pipeline::SourceAdapter`] trait implemented by the
//! `market-data` crate's feed client.

pub mod cleaner;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipeline;
pub mod records;
pub mod reporting;
pub mod runs;
pub mod store;

pub use config::PipelineConfig;
pub use pipeline::{PipelineService, RunOptions, RunOutcome, SourceAdapter};
pub use records::{Dataset, DatasetKind, FetchTimestamp, MarketRecord, NewsRecord, RecordFilter};
pub use runs::{PipelineRun, RunCounts, RunStatus};
pub use store::PipelineStore;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
