//! Cleaner: maps raw feed payloads onto the canonical record schema.
//!
//! Steps, in order:
//!
//! 1. key normalization (`normalize`)
//! 2. type coercion and text cleanup
//! 3. null handling (numeric nulls become zero, string nulls empty)
//! 4. duplicate elimination by natural key, last row wins
//! 5. range validation
//!
//! Data-quality problems never raise; they are counted in the [`CleanReport`].
//! Only a non-tabular payload is an error ([`StructuralError`]).
//!
//! [`StructuralError`]: crate::errors::StructuralError

mod cleaner_model;
mod cleaner_service;
pub mod export;
mod normalize;


pub use cleaner_model::{CleanReport, DataQualityIssue};
pub use cleaner_service::clean;
pub use export::{cleaned_export_path, export_cleaned};
