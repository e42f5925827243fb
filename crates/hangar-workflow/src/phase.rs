//! Release phases and progress reporting

use hangar_core::{ConnectorId, OutputLine};

/// Per-connector release phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleasePhase {
    /// Connector picked up from the change set
    Start,
    /// Reading the changelog
    ResolveVersion,
    /// Checking the container engine
    PreflightRuntime,
    /// Probing the registry for the target tag
    GuardAgainstExistingPublish,
    /// Building the image
    Build,
    /// Pushing the tags
    Push,
    /// Connector finished
    Done,
}

impl ReleasePhase {
    /// Get the phase name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ResolveVersion => "resolve-version",
            Self::PreflightRuntime => "preflight-runtime",
            Self::GuardAgainstExistingPublish => "guard",
            Self::Build => "build",
            Self::Push => "push",
            Self::Done => "done",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "Processing changes",
            Self::ResolveVersion => "Resolving version",
            Self::PreflightRuntime => "Validating container engine",
            Self::GuardAgainstExistingPublish => "Checking registry",
            Self::Build => "Building image",
            Self::Push => "Publishing image",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for ReleasePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Receives progress as the orchestrator moves through phases.
///
/// Calls are informational only; they cannot change the control flow.
pub trait ReleaseObserver: Send + Sync {
    /// A phase is about to run
    fn phase_started(&self, _connector: &ConnectorId, _phase: ReleasePhase) {}

    /// A phase completed; `detail` summarises the result
    fn phase_finished(&self, _connector: &ConnectorId, _phase: ReleasePhase, _detail: &str) {}

    /// The container engine printed a line during build or push
    fn engine_output(&self, _connector: &ConnectorId, _line: OutputLine<'_>) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ReleaseObserver for NoopObserver {}
