pub mod cli;
pub mod errors;
pub mod loader;
pub mod report;
pub mod workflow;

pub use errors::FrontendError;
pub use report::WorkflowReport;
pub use workflow::{WorkflowOptions, run, run_with};
