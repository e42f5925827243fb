//! Container runtime preflight checks

use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use hangar_core::error::{HangarError, Result, RuntimeError};

use super::DockerEngine;

/// First dotted version number in `--version` output
static VERSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<major>\d+)\.(?P<minor>\d+)(?:\.(?P<patch>\d+))?").expect("Invalid regex")
});

/// What the preflight found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    /// Engine binary checked
    pub engine: String,
    /// Client version reported by `--version`
    pub version: semver::Version,
}

/// Confirms the engine is installed and its daemon answers
pub struct RuntimeAvailabilityChecker<'e, 'a> {
    engine: &'e DockerEngine<'a>,
}

impl<'e, 'a> RuntimeAvailabilityChecker<'e, 'a> {
    /// Create a checker for `engine`
    pub fn new(engine: &'e DockerEngine<'a>) -> Self {
        Self { engine }
    }

    /// Run both checks, binary first
    pub fn check(&self) -> Result<RuntimeInfo> {
        let version = self.check_installed()?;
        self.check_running()?;
        Ok(RuntimeInfo {
            engine: self.engine.binary().to_string(),
            version,
        })
    }

    /// `<engine> --version` must report a version number
    pub fn check_installed(&self) -> Result<semver::Version> {
        info!(engine = self.engine.binary(), "validating engine");

        let output = match self.engine.run(&self.engine.command().arg("--version")) {
            Ok(output) => output,
            Err(HangarError::Process(e)) => {
                warn!(error = %e, "engine version query could not run");
                return Err(self.missing());
            }
            Err(e) => return Err(e),
        };

        match parse_engine_version(&output.stdout) {
            Some(version) => {
                info!(engine = self.engine.binary(), version = %version, "found engine version");
                Ok(version)
            }
            None => {
                warn!(stdout = %output.stdout.trim(), "no version in engine output");
                Err(self.missing())
            }
        }
    }

    /// `<engine> version` must not write anything to stderr
    pub fn check_running(&self) -> Result<()> {
        info!(engine = self.engine.binary(), "validating engine is running");
        let output = self.engine.run(&self.engine.command().arg("version"))?;

        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            return Err(RuntimeError::DaemonUnreachable {
                engine: self.engine.binary().to_string(),
                stderr: stderr.to_string(),
            }
            .into());
        }

        info!(engine = self.engine.binary(), "engine is running");
        Ok(())
    }

    fn missing(&self) -> HangarError {
        RuntimeError::EngineMissing {
            engine: self.engine.binary().to_string(),
            install_url: self.engine.install_url().to_string(),
        }
        .into()
    }
}

/// Extract the client version from e.g. `Docker version 24.0.7, build afdd53b`
pub(crate) fn parse_engine_version(output: &str) -> Option<semver::Version> {
    let caps = VERSION_REGEX.captures(output)?;
    let major = caps.name("major")?.as_str().parse().ok()?;
    let minor = caps.name("minor")?.as_str().parse().ok()?;
    let patch = match caps.name("patch") {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some(semver::Version::new(major, minor, patch))
}
