//! Change detection for the connectors monorepo

use tracing::{debug, info};

use hangar_core::config::{ConnectorsConfig, GitConfig};
use hangar_core::error::Result;
use hangar_core::ConnectorId;

use crate::repository::GitRepo;
use crate::types::ChangeSet;

/// Finds the connectors touched by the latest commit
pub struct ChangeSetDetector<'r, 'a> {
    repo: &'r GitRepo<'a>,
    head: String,
    base: String,
    prefix: String,
}

impl<'r, 'a> ChangeSetDetector<'r, 'a> {
    /// Create a detector comparing `git.head` against `git.base`
    pub fn new(repo: &'r GitRepo<'a>, git: &GitConfig, connectors: &ConnectorsConfig) -> Self {
        Self {
            repo,
            head: git.head.clone(),
            base: git.base.clone(),
            prefix: connectors.prefix(),
        }
    }

    /// Revision holding the change
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Revision diffed against
    pub fn base(&self) -> &str {
        &self.base
    }

    /// List the changed files
    pub fn change_set(&self) -> Result<ChangeSet> {
        info!(head = %self.head, base = %self.base, "getting files changed");
        let changes = self.repo.changed_files(&self.head, &self.base)?;
        info!(files = changes.len(), "files changed");
        Ok(changes)
    }

    /// Connectors named by the change set
    pub fn connectors(&self, changes: &ChangeSet) -> Vec<ConnectorId> {
        let connectors = changes.connectors(&self.prefix);
        debug!(
            prefix = %self.prefix,
            connectors = ?connectors.iter().map(ConnectorId::as_str).collect::<Vec<_>>(),
            "extracted connectors"
        );
        connectors
    }
}
