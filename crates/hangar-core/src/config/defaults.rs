//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "hangar.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "hangar.yaml";

/// Directory, relative to the repository root, that holds one folder per connector
pub const DEFAULT_CONNECTORS_ROOT: &str = "airbyte-integrations/connectors";

/// Changelog file name inside each connector directory
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Container engine CLI
pub const DEFAULT_ENGINE: &str = "docker";

/// Where to send people who do not have the engine installed
pub const DEFAULT_ENGINE_INSTALL_URL: &str = "https://docs.docker.com/get-docker/";

/// Registry namespace images are published under
pub const DEFAULT_NAMESPACE: &str = "airbytedotnet";

/// Build argument that carries the release version into the image
pub const DEFAULT_BUILD_ARG: &str = "BUILD_VERSION";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".hangar.toml",
        ".hangar.yaml",
    ]
}
