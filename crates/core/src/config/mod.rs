//! Pipeline configuration.

mod config_model;


pub use config_model::{PipelineConfig, CONFIG_ENV_PREFIX, DEFAULT_CONFIG_FILE};
