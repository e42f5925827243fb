//! Hangar Adapters - Container engine adapter for the release pipeline
//!
//! This crate drives the container engine CLI (Docker by default): runtime
//! preflight checks, the registry manifest probe, image build and push.

pub mod docker;

pub use docker::{DockerEngine, PublishGuard, RuntimeAvailabilityChecker, RuntimeInfo};
