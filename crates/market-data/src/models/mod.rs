//! Feed models
//!
//! - `dataset` - Dataset kinds handled by the pipeline (market, news)
//! - `outcome` - Result of one fetch, live or synthetic

mod dataset;
mod outcome;

pub use dataset::{DatasetKind, ParseDatasetKindError};
pub use outcome::FetchOutcome;
