//! Hangar Core - Core library for the connector release pipeline
//!
//! This crate provides the error taxonomy, domain types, configuration and the
//! process-execution capability shared by every stage of the pipeline.

pub mod config;
pub mod error;
pub mod process;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use config::Config;
pub use error::{HangarError, Result};
pub use process::{CommandSpec, OutputLine, ProcessOutput, ProcessRunner, SystemRunner};
pub use types::{BuildTarget, ConnectorId, PublishOutcome, SemanticVersion};
