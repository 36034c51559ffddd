//! Storage interface for records and the run ledger.

mod store_traits;

pub use store_traits::{PipelineStore, StoreStats};
