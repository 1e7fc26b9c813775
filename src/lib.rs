pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod table;
pub mod validate;

pub use config::PipelineConfig;
pub use error::{ValidationError, ValidationResult};
pub use pipeline::{run, RunSummary};
