//! Docker image adapter
//!
//! Builds connector images with a versioned and a `latest` tag and pushes them
//! to the registry. Works with any engine that speaks the Docker CLI.

mod manifest;
mod runtime;

use tracing::{debug, info};

use hangar_core::config::{EngineConfig, DEFAULT_BUILD_ARG};
use hangar_core::error::{AdapterError, Result};
use hangar_core::{BuildTarget, CommandSpec, OutputLine, ProcessOutput, ProcessRunner};

pub use manifest::PublishGuard;
pub use runtime::{RuntimeAvailabilityChecker, RuntimeInfo};

/// Lines of engine output kept in error messages
const ERROR_TAIL_LINES: usize = 20;

/// Container engine CLI adapter
pub struct DockerEngine<'a> {
    runner: &'a dyn ProcessRunner,
    /// Engine binary (e.g. `docker`, `podman`)
    binary: String,
    /// Installation page for the engine
    install_url: String,
    /// Build argument carrying the version
    build_arg: String,
}

impl<'a> DockerEngine<'a> {
    /// Create an adapter for the configured engine
    pub fn new(runner: &'a dyn ProcessRunner, config: &EngineConfig) -> Self {
        Self {
            runner,
            binary: config.binary.clone(),
            install_url: config.install_url.clone(),
            build_arg: DEFAULT_BUILD_ARG.to_string(),
        }
    }

    /// Set the build argument name carrying the version
    pub fn with_build_arg(mut self, build_arg: impl Into<String>) -> Self {
        self.build_arg = build_arg.into();
        self
    }

    /// Engine binary name
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Installation page for the engine
    pub fn install_url(&self) -> &str {
        &self.install_url
    }

    pub(crate) fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.binary)
    }

    pub(crate) fn run(&self, command: &CommandSpec) -> Result<ProcessOutput> {
        self.runner.run(command)
    }

    /// Run `command`, logging each line and handing it to `on_line` as it is printed
    fn run_streaming(
        &self,
        command: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine<'_>),
    ) -> Result<ProcessOutput> {
        self.runner.run_streaming(command, &mut |line| {
            debug!(target: "hangar::engine", "{}", line.text());
            on_line(line);
        })
    }

    /// `build --build-arg <ARG>=<version> -t <image>:<version> -t <image>:latest .`
    pub fn build_command(&self, target: &BuildTarget) -> CommandSpec {
        let [versioned, latest] = target.tags();
        self.command()
            .arg("build")
            .arg("--build-arg")
            .arg(format!("{}={}", self.build_arg, target.version))
            .args(["-t".to_string(), versioned, "-t".to_string(), latest])
            .arg(".")
            .current_dir(&target.path)
    }

    /// `push -a <image>`
    pub fn push_command(&self, target: &BuildTarget) -> CommandSpec {
        self.command().args(["push", "-a", target.image.as_str()])
    }

    /// Build the image in the connector directory, tagged with both tags
    pub fn build(&self, target: &BuildTarget) -> Result<()> {
        self.build_with_output(target, &mut |_| {})
    }

    /// Like [`build`](Self::build), handing engine output to `on_line` while it runs
    pub fn build_with_output(
        &self,
        target: &BuildTarget,
        on_line: &mut dyn FnMut(OutputLine<'_>),
    ) -> Result<()> {
        let command = self.build_command(target);
        info!(image = %target.versioned_tag(), path = %target.path.display(), "building image");
        debug!(command = %command, "build command");

        let output = self.run_streaming(&command, on_line)?;

        if !output.success() {
            return Err(AdapterError::BuildFailed {
                image: target.versioned_tag(),
                reason: tail(&output),
            }
            .into());
        }

        info!(image = %target.versioned_tag(), "image built");
        Ok(())
    }

    /// Push every local tag of the target image
    pub fn push(&self, target: &BuildTarget) -> Result<()> {
        self.push_with_output(target, &mut |_| {})
    }

    /// Like [`push`](Self::push), handing engine output to `on_line` while it runs
    pub fn push_with_output(
        &self,
        target: &BuildTarget,
        on_line: &mut dyn FnMut(OutputLine<'_>),
    ) -> Result<()> {
        let command = self.push_command(target);
        info!(image = %target.image, "publishing image");
        debug!(command = %command, "push command");

        let output = self.run_streaming(&command, on_line)?;

        if !output.success() {
            return Err(AdapterError::PushFailed {
                image: target.image.clone(),
                reason: tail(&output),
            }
            .into());
        }

        info!(image = %target.image, "image published");
        Ok(())
    }
}

/// Exit status plus the last lines of stderr (or stdout when stderr is empty)
fn tail(output: &ProcessOutput) -> String {
    let source = if output.stderr.trim().is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    let lines: Vec<&str> = source.lines().collect();
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    let excerpt = lines[start..].join("\n");

    let status = match output.exit_code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    };
    if excerpt.trim().is_empty() {
        status
    } else {
        format!("{}: {}", status, excerpt.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangar_core::error::HangarError;
    use hangar_core::testing::ScriptedRunner;
    use hangar_core::{ConnectorId, SemanticVersion};
    use std::path::Path;

    fn target() -> BuildTarget {
        BuildTarget::new(
            ConnectorId::new("source-foo"),
            "/repo/airbyte-integrations/connectors/source-foo",
            "airbytedotnet/source-foo",
            SemanticVersion::new(1, 0, 1),
        )
    }

    #[test]
    fn test_build_command() {
        let runner = ScriptedRunner::new();
        let engine = DockerEngine::new(&runner, &EngineConfig::default());

        let command = engine.build_command(&target());
        assert_eq!(
            command.to_string(),
            "docker build --build-arg BUILD_VERSION=1.0.1 -t airbytedotnet/source-foo:1.0.1 -t airbytedotnet/source-foo:latest ."
        );
        assert_eq!(
            command.working_dir.as_deref(),
            Some(Path::new("/repo/airbyte-integrations/connectors/source-foo"))
        );
    }

    #[test]
    fn test_custom_engine_and_build_arg() {
        let runner = ScriptedRunner::new();
        let config = EngineConfig {
            binary: "podman".to_string(),
            ..Default::default()
        };
        let engine = DockerEngine::new(&runner, &config).with_build_arg("VERSION");

        let command = engine.build_command(&target());
        assert_eq!(command.program, "podman");
        assert_eq!(command.args[2], "VERSION=1.0.1");
        assert_eq!(
            engine.push_command(&target()).to_string(),
            "podman push -a airbytedotnet/source-foo"
        );
    }

    #[test]
    fn test_build_failure() {
        let runner = ScriptedRunner::new().on(
            "docker",
            &["build"],
            ProcessOutput::failed(1, "step 3/7: COPY failed"),
        );
        let engine = DockerEngine::new(&runner, &EngineConfig::default());

        let err = engine.build(&target()).unwrap_err();
        assert!(matches!(err, HangarError::Adapter(AdapterError::BuildFailed { .. })));
        assert!(err.to_string().contains("COPY failed"));
    }

    #[test]
    fn test_push_success_and_failure() {
        let runner = ScriptedRunner::new().on("docker", &["push"], ProcessOutput::ok("pushed"));
        let engine = DockerEngine::new(&runner, &EngineConfig::default());
        assert!(engine.push(&target()).is_ok());

        let runner = ScriptedRunner::new().on(
            "docker",
            &["push"],
            ProcessOutput::failed(1, "denied: requested access to the resource is denied"),
        );
        let engine = DockerEngine::new(&runner, &EngineConfig::default());
        let err = engine.push(&target()).unwrap_err();
        assert!(matches!(err, HangarError::Adapter(AdapterError::PushFailed { .. })));
    }

    #[test]
    fn test_build_output_is_forwarded() {
        let runner = ScriptedRunner::new().on(
            "docker",
            &["build"],
            ProcessOutput::ok("Step 1/2 : FROM alpine\nSuccessfully built abc123\n"),
        );
        let engine = DockerEngine::new(&runner, &EngineConfig::default());

        let mut lines = Vec::new();
        engine
            .build_with_output(&target(), &mut |line| lines.push(line.text().to_string()))
            .unwrap();
        assert_eq!(lines, vec!["Step 1/2 : FROM alpine", "Successfully built abc123"]);
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        let stderr: String = (0..50).map(|i| format!("line {}\n", i)).collect();
        let reason = tail(&ProcessOutput::failed(2, stderr));
        assert!(reason.starts_with("exit code 2: line 30"));
        assert!(reason.ends_with("line 49"));
        assert_eq!(tail(&ProcessOutput::failed(1, "")), "exit code 1");
    }
}
