//! Release run reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hangar_core::{BuildTarget, ConnectorId, PublishOutcome, SemanticVersion};

/// What happened to one connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRelease {
    /// Connector processed
    pub connector: ConnectorId,
    /// Version resolved from the changelog, if it got that far
    pub version: Option<SemanticVersion>,
    /// Untagged image name, if a target was resolved
    pub image: Option<String>,
    /// Result
    pub outcome: PublishOutcome,
}

impl ConnectorRelease {
    /// Record an outcome for a resolved target
    pub fn for_target(target: &BuildTarget, outcome: PublishOutcome) -> Self {
        Self {
            connector: target.connector.clone(),
            version: Some(target.version),
            image: Some(target.image.clone()),
            outcome,
        }
    }

    /// Record a connector that failed before a target existed
    pub fn unresolved(connector: &ConnectorId, reason: impl Into<String>) -> Self {
        Self {
            connector: connector.clone(),
            version: None,
            image: None,
            outcome: PublishOutcome::Failed(reason.into()),
        }
    }
}

/// Summary of one pipeline invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseReport {
    /// Push phase was suppressed
    pub build_only: bool,
    /// Number of files in the change set
    pub changed_files: usize,
    /// Per-connector records, in processing order
    pub connectors: Vec<ConnectorRelease>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run ended, successfully or not
    pub finished_at: Option<DateTime<Utc>>,
}

impl ReleaseReport {
    /// Start a new report
    pub fn new(build_only: bool) -> Self {
        Self {
            build_only,
            changed_files: 0,
            connectors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Append a connector record
    pub fn record(&mut self, release: ConnectorRelease) {
        self.connectors.push(release);
    }

    /// Stamp the end time
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Whether the run had nothing to do
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}
