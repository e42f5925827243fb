//! Configuration types

use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Main configuration for Hangar
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Revisions compared to find the change set
    pub git: GitConfig,

    /// Where connectors live in the monorepo
    pub connectors: ConnectorsConfig,

    /// Container engine settings
    pub engine: EngineConfig,

    /// Image naming and registry settings
    pub registry: RegistryConfig,

    /// Pipeline behaviour
    pub release: ReleaseConfig,
}

/// Git configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Revision holding the change being released
    pub head: String,

    /// Revision to diff against
    pub base: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            head: "HEAD".to_string(),
            base: "HEAD~1".to_string(),
        }
    }
}

/// Connector layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorsConfig {
    /// Connectors root, relative to the repository root, `/`-separated
    pub root: String,

    /// Changelog file name inside a connector directory
    pub changelog: String,
}

impl Default for ConnectorsConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_CONNECTORS_ROOT.to_string(),
            changelog: DEFAULT_CHANGELOG_FILE.to_string(),
        }
    }
}

impl ConnectorsConfig {
    /// The root as a path prefix with exactly one trailing slash
    pub fn prefix(&self) -> String {
        format!("{}/", self.root.trim_end_matches('/'))
    }
}

/// Container engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine CLI binary
    pub binary: String,

    /// Installation page shown when the binary is missing
    pub install_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_ENGINE.to_string(),
            install_url: DEFAULT_ENGINE_INSTALL_URL.to_string(),
        }
    }
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry host (e.g. `ghcr.io`); Docker Hub when None
    pub host: Option<String>,

    /// Namespace images are published under
    pub namespace: String,

    /// Build argument carrying the version
    pub build_arg: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
            build_arg: DEFAULT_BUILD_ARG.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Untagged image name for a connector
    pub fn image_name(&self, connector: &str) -> String {
        match &self.host {
            Some(host) => format!("{}/{}/{}", host.trim_end_matches('/'), self.namespace, connector),
            None => format!("{}/{}", self.namespace, connector),
        }
    }
}

/// Release pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Treat an empty diff as a successful no-op instead of an error
    pub allow_empty: bool,
}
