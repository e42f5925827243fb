//! Hangar Workflow - Release orchestration
//!
//! Drives change detection, version resolution, runtime preflight, the
//! publish guard and the image build/push for every changed connector.

mod error;
mod phase;
mod release;
mod report;

pub use error::ReleaseAbort;
pub use phase::{NoopObserver, ReleaseObserver, ReleasePhase};
pub use release::{ReleaseOptions, ReleaseOrchestrator};
pub use report::{ConnectorRelease, ReleaseReport};
