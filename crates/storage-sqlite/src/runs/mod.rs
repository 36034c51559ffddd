//! SQLite storage for the pipeline run ledger.

mod model;
mod repository;

pub use model::PipelineRunDB;
pub use repository::RunRepository;
