//! Hangar Git - Change-set detection for the release pipeline
//!
//! This crate talks to the system `git` binary through a
//! [`ProcessRunner`](hangar_core::ProcessRunner) to find the repository root and
//! the files touched by the latest commit, and maps those files to connectors.

mod changes;
mod repository;
pub mod types;

pub use changes::ChangeSetDetector;
pub use repository::GitRepo;
pub use types::ChangeSet;
