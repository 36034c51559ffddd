//! Reporter: aggregate statistics over stored records and report artifacts.
//!
//! - [`reporting_model`] - summaries, options and artifact paths
//! - [`statistics`] - per-column descriptive statistics
//! - [`summarize`] - market and news summaries
//! - [`render`] - `daily_report_{ts}.txt`, per-dataset CSVs and `daily_summary_{ts}.csv`

mod reporting_model;
pub mod render;
pub mod statistics;
pub mod summarize;

#[cfg(test)]
mod reporting_tests;

pub use render::render;
pub use reporting_model::{
    ColumnStats, MarketSortKey, MarketSummary, NewsSummary, ReportArtifacts, ReportOptions,
    ReportSection, RunMeta, Summary, TopAsset,
};
pub use summarize::summarize;
