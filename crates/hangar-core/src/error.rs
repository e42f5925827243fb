//! Error types for Hangar

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using HangarError
pub type Result<T> = std::result::Result<T, HangarError>;

/// Main error type for Hangar operations
#[derive(Debug, Error)]
pub enum HangarError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// External process errors
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// Container runtime availability errors
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Container engine adapter errors
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Release pipeline errors
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while launching external commands
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Program is not on PATH
    #[error("Command not found: {0}")]
    NotFound(String),

    /// Program exists but could not be started
    #[error("Failed to run {command}: {reason}")]
    SpawnFailed { command: String, reason: String },
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a git work tree
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// The diff between the two revisions could not be computed
    #[error("Failed to list files changed between {base} and {head}: {reason}")]
    DiffFailed {
        base: String,
        head: String,
        reason: String,
    },
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Changelog exists but could not be read
    #[error("Failed to read changelog {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },
}

/// Container runtime availability errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Engine CLI missing or not reporting a version
    #[error("Could not find {engine}, please download at: {install_url}")]
    EngineMissing { engine: String, install_url: String },

    /// Engine CLI present but its daemon is not answering
    #[error("{engine} is currently not running, please start {engine} first! ({stderr})")]
    DaemonUnreachable { engine: String, stderr: String },
}

/// Container engine adapter errors
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Image build failed
    #[error("Failed to build image {image}: {reason}")]
    BuildFailed { image: String, reason: String },

    /// Image push failed
    #[error("Failed to push image {image}: {reason}")]
    PushFailed { image: String, reason: String },
}

/// Release pipeline errors
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The diff reported no files at all
    #[error("No changed files found between {base} and {head}")]
    NoChanges { base: String, head: String },

    /// Files changed, but none under the connectors root
    #[error("Could not find any changed connector files ({files} changed files outside {root})")]
    NoConnectors { files: usize, root: String },

    /// No semantic version could be read from the connector's changelog
    #[error("Could not acquire a version for connector {connector} from {changelog}")]
    MissingVersion { connector: String, changelog: PathBuf },

    /// Target tag already exists in the registry
    #[error("Image {image} already exists remotely, please update the CHANGELOG.md with a new version before proceeding")]
    AlreadyPublished { image: String },
}
