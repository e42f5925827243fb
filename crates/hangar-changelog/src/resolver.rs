//! Changelog version resolver

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use hangar_core::config::DEFAULT_CHANGELOG_FILE;
use hangar_core::error::{ChangelogError, Result};
use hangar_core::SemanticVersion;

/// Characters that separate version tokens in addition to spaces.
///
/// `#` strips markdown headings and `v` strips `v1.2.3` prefixes.
const SEPARATORS: [char; 4] = ['\n', '\r', '#', 'v'];

/// Highest version mentioned anywhere in `text`
///
/// Tokens that are not a strict `major.minor.patch` triple are ignored.
pub fn highest_version(text: &str) -> Option<SemanticVersion> {
    let normalized: String = text
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();

    normalized
        .split(' ')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<SemanticVersion>().ok())
        .max()
}

/// Reads the release version out of a connector's changelog
#[derive(Debug, Clone)]
pub struct VersionResolver {
    file_name: String,
}

impl VersionResolver {
    /// Resolver reading `CHANGELOG.md`
    pub fn new() -> Self {
        Self::with_file_name(DEFAULT_CHANGELOG_FILE)
    }

    /// Resolver reading a differently named changelog
    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// Changelog location for a connector directory
    pub fn changelog_path(&self, connector_dir: &Path) -> PathBuf {
        connector_dir.join(&self.file_name)
    }

    /// Highest version in the connector's changelog.
    ///
    /// Returns `Ok(None)` when the changelog is missing or mentions no version.
    pub fn resolve(&self, connector_dir: &Path) -> Result<Option<SemanticVersion>> {
        let path = self.changelog_path(connector_dir);

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %path.display(), "could not find changelog");
                return Ok(None);
            }
            Err(e) => {
                return Err(ChangelogError::ReadFailed {
                    path,
                    reason: e.to_string(),
                }
                .into())
            }
        };
        // Invalid UTF-8 in prose must not hide the versions around it
        let contents = String::from_utf8_lossy(&bytes);
        debug!(path = %path.display(), bytes = bytes.len(), "read changelog");

        match highest_version(&contents) {
            Some(version) => {
                info!(version = %version, "found connector version");
                Ok(Some(version))
            }
            None => {
                warn!(path = %path.display(), "could not find any semver versions");
                Ok(None)
            }
        }
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new()
    }
}
