//! Git types

use serde::{Deserialize, Serialize};

use hangar_core::ConnectorId;

/// Files changed between two revisions, as reported by `git diff --name-only`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    files: Vec<String>,
}

impl ChangeSet {
    /// Build a change set from raw diff output, one path per line
    pub fn from_diff_output(output: &str) -> Self {
        let files = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Self { files }
    }

    /// Build a change set from a list of paths
    pub fn from_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    /// Changed paths in diff order
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Number of changed paths
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing changed
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Distinct connectors touched by this change set.
    ///
    /// `prefix` is the connectors root with a trailing `/`. Paths outside it are
    /// ignored; the first segment after it names the connector. First-seen order
    /// is kept but carries no meaning.
    pub fn connectors(&self, prefix: &str) -> Vec<ConnectorId> {
        let mut connectors: Vec<ConnectorId> = Vec::new();

        for file in &self.files {
            let Some(rest) = file.strip_prefix(prefix) else {
                continue;
            };
            let name = rest.split('/').next().unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            let id = ConnectorId::new(name);
            if !connectors.contains(&id) {
                connectors.push(id);
            }
        }

        connectors
    }
}
