//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_git(config)?;
    validate_connectors(config)?;
    validate_engine(config)?;
    validate_registry(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: &str, message: &str) -> crate::error::HangarError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

fn validate_git(config: &Config) -> Result<()> {
    if config.git.head.trim().is_empty() {
        return Err(invalid("git.head", "revision cannot be empty"));
    }
    if config.git.base.trim().is_empty() {
        return Err(invalid("git.base", "revision cannot be empty"));
    }
    Ok(())
}

fn validate_connectors(config: &Config) -> Result<()> {
    let root = config.connectors.root.trim_matches('/');
    if root.is_empty() {
        return Err(invalid("connectors.root", "root cannot be empty"));
    }
    if root.contains('\\') {
        return Err(invalid("connectors.root", "use '/' as the path separator"));
    }

    let changelog = &config.connectors.changelog;
    if changelog.is_empty() || changelog.contains('/') || changelog.contains('\\') {
        return Err(invalid(
            "connectors.changelog",
            "must be a file name inside the connector directory",
        ));
    }
    Ok(())
}

fn validate_engine(config: &Config) -> Result<()> {
    if config.engine.binary.trim().is_empty() {
        return Err(invalid("engine.binary", "binary cannot be empty"));
    }
    Ok(())
}

fn validate_registry(config: &Config) -> Result<()> {
    let namespace = &config.registry.namespace;
    if namespace.is_empty() {
        return Err(invalid("registry.namespace", "namespace cannot be empty"));
    }
    if namespace.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace()) {
        return Err(invalid(
            "registry.namespace",
            "image references must be lowercase without spaces",
        ));
    }
    if config.registry.build_arg.is_empty() || config.registry.build_arg.contains('=') {
        return Err(invalid(
            "registry.build_arg",
            "must be a non-empty argument name without '='",
        ));
    }
    Ok(())
}
