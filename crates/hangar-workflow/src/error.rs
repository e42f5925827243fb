//! Release abort error

use thiserror::Error;

use hangar_core::HangarError;

use crate::report::ReleaseReport;

/// A run stopped by a fatal error, with everything recorded up to that point
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ReleaseAbort {
    /// Connectors processed before (and including) the failure
    pub report: ReleaseReport,
    /// The causing error
    pub error: HangarError,
}

impl ReleaseAbort {
    /// Wrap `error`, closing the report
    pub fn new(report: ReleaseReport, error: impl Into<HangarError>) -> Self {
        Self {
            report: report.finish(),
            error: error.into(),
        }
    }
}
