//! Pipeline run ledger: the run record and its status state machine.

mod runs_model;


pub use runs_model::{PipelineRun, RunCounts, RunStatus};
