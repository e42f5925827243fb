//! Core types for Hangar

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Name of a connector directory under the connectors root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorId(String);

impl ConnectorId {
    /// Create a connector id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for ConnectorId {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// A strict `major.minor.patch` version
///
/// Unlike full SemVer there are no pre-release or build components; anything
/// beyond three numeric parts is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    /// Create a version from its parts
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut next = || -> Result<u64, String> {
            let part = parts
                .next()
                .ok_or_else(|| format!("Invalid version: {}", s))?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("Invalid version: {}", s));
            }
            part.parse::<u64>()
                .map_err(|e| format!("Invalid version {}: {}", s, e))
        };

        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(format!("Invalid version: {}", s));
        }
        Ok(version)
    }
}

impl Serialize for SemanticVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Everything needed to build and tag one connector image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    /// Connector being released
    pub connector: ConnectorId,
    /// Connector directory, used as the build context
    pub path: PathBuf,
    /// Image name without a tag (e.g. `airbytedotnet/source-foo`)
    pub image: String,
    /// Version resolved from the changelog
    pub version: SemanticVersion,
}

impl BuildTarget {
    /// Create a build target
    pub fn new(
        connector: ConnectorId,
        path: impl Into<PathBuf>,
        image: impl Into<String>,
        version: SemanticVersion,
    ) -> Self {
        Self {
            connector,
            path: path.into(),
            image: image.into(),
            version,
        }
    }

    /// `{image}:{version}`
    pub fn versioned_tag(&self) -> String {
        format!("{}:{}", self.image, self.version)
    }

    /// `{image}:latest`
    pub fn latest_tag(&self) -> String {
        format!("{}:latest", self.image)
    }

    /// Both tags, versioned first
    pub fn tags(&self) -> [String; 2] {
        [self.versioned_tag(), self.latest_tag()]
    }
}

/// Result of processing one connector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// Image built locally, nothing pushed
    Built,
    /// Image built and all tags pushed
    BuiltAndPushed,
    /// Versioned tag was already in the registry
    SkippedAlreadyPublished,
    /// Processing stopped with an error
    Failed(String),
}

impl PublishOutcome {
    /// Returns the string representation of the outcome
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Built => "built",
            Self::BuiltAndPushed => "built and pushed",
            Self::SkippedAlreadyPublished => "already published",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether the connector finished without error
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Built | Self::BuiltAndPushed)
    }
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.as_str()),
        }
    }
}
