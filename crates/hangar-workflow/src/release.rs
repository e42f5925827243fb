//! Release workflow orchestration

use std::path::PathBuf;

use tracing::{error, info, warn};

use hangar_adapters::{DockerEngine, PublishGuard, RuntimeAvailabilityChecker};
use hangar_changelog::VersionResolver;
use hangar_core::config::Config;
use hangar_core::error::{HangarError, ReleaseError, Result};
use hangar_core::{BuildTarget, ConnectorId, ProcessRunner, PublishOutcome};
use hangar_git::{ChangeSetDetector, GitRepo};

use crate::error::ReleaseAbort;
use crate::phase::{NoopObserver, ReleaseObserver, ReleasePhase};
use crate::report::{ConnectorRelease, ReleaseReport};

/// Options for a release run
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Build images but do not push them
    pub build_only: bool,
}

impl ReleaseOptions {
    /// Options for a build-only run
    pub fn build_only() -> Self {
        Self { build_only: true }
    }

    /// Whether tags are pushed after a successful build
    pub fn push_requested(&self) -> bool {
        !self.build_only
    }
}

/// Drives the release of every connector touched by the latest commit.
///
/// Connectors are processed one at a time. The first error ends the run.
pub struct ReleaseOrchestrator<'a> {
    config: &'a Config,
    runner: &'a dyn ProcessRunner,
    repo_root: PathBuf,
    options: ReleaseOptions,
    observer: &'a dyn ReleaseObserver,
}

impl<'a> ReleaseOrchestrator<'a> {
    /// Create an orchestrator for the work tree at `repo_root`
    pub fn new(
        config: &'a Config,
        runner: &'a dyn ProcessRunner,
        repo_root: impl Into<PathBuf>,
        options: ReleaseOptions,
    ) -> Self {
        Self {
            config,
            runner,
            repo_root: repo_root.into(),
            options,
            observer: &NoopObserver,
        }
    }

    /// Report progress to `observer`
    pub fn with_observer(mut self, observer: &'a dyn ReleaseObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Run the pipeline
    pub fn execute(&self) -> std::result::Result<ReleaseReport, ReleaseAbort> {
        let mut report = ReleaseReport::new(self.options.build_only);
        if self.options.build_only {
            info!("running as build only");
        }

        let connectors = match self.changed_connectors(&mut report) {
            Ok(connectors) => connectors,
            Err(e) => return Err(self.abort(report, e)),
        };

        let engine = self.engine();
        for connector in &connectors {
            self.observer.phase_started(connector, ReleasePhase::Start);
            info!(connector = %connector, "processing changes for connector");

            let target = match self.resolve_target(connector) {
                Ok(target) => target,
                Err(e) => {
                    report.record(ConnectorRelease::unresolved(connector, e.to_string()));
                    return Err(self.abort(report, e));
                }
            };

            match self.publish_target(&engine, &target) {
                Ok(outcome) => {
                    self.observer
                        .phase_finished(connector, ReleasePhase::Done, outcome.as_str());
                    report.record(ConnectorRelease::for_target(&target, outcome));
                }
                Err(e) => {
                    let outcome = match &e {
                        HangarError::Release(ReleaseError::AlreadyPublished { .. }) => {
                            PublishOutcome::SkippedAlreadyPublished
                        }
                        other => PublishOutcome::Failed(other.to_string()),
                    };
                    report.record(ConnectorRelease::for_target(&target, outcome));
                    return Err(self.abort(report, e));
                }
            }
        }

        info!(connectors = report.connectors.len(), "release run complete");
        Ok(report.finish())
    }

    /// Directory of a connector inside the work tree
    pub fn connector_path(&self, connector: &ConnectorId) -> PathBuf {
        let mut path = self.repo_root.clone();
        for segment in self.config.connectors.root.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.join(connector)
    }

    /// Resolve the version and image for a connector
    pub fn resolve_target(&self, connector: &ConnectorId) -> Result<BuildTarget> {
        self.observer
            .phase_started(connector, ReleasePhase::ResolveVersion);

        let path = self.connector_path(connector);
        let resolver = VersionResolver::with_file_name(&self.config.connectors.changelog);
        let version = resolver
            .resolve(&path)?
            .ok_or_else(|| ReleaseError::MissingVersion {
                connector: connector.to_string(),
                changelog: resolver.changelog_path(&path),
            })?;

        let image = self.config.registry.image_name(connector.as_str());
        let target = BuildTarget::new(connector.clone(), path, image, version);

        self.observer
            .phase_finished(connector, ReleasePhase::ResolveVersion, &version.to_string());
        Ok(target)
    }

    fn changed_connectors(&self, report: &mut ReleaseReport) -> Result<Vec<ConnectorId>> {
        let repo = GitRepo::open(self.runner, &self.repo_root);
        let detector = ChangeSetDetector::new(&repo, &self.config.git, &self.config.connectors);

        let changes = detector.change_set()?;
        report.changed_files = changes.len();

        if changes.is_empty() {
            if self.config.release.allow_empty {
                warn!("no changed files, nothing to release");
                return Ok(Vec::new());
            }
            return Err(ReleaseError::NoChanges {
                base: detector.base().to_string(),
                head: detector.head().to_string(),
            }
            .into());
        }

        let connectors = detector.connectors(&changes);
        if connectors.is_empty() {
            return Err(ReleaseError::NoConnectors {
                files: changes.len(),
                root: self.config.connectors.root.clone(),
            }
            .into());
        }

        Ok(connectors)
    }

    fn engine(&self) -> DockerEngine<'a> {
        DockerEngine::new(self.runner, &self.config.engine)
            .with_build_arg(&self.config.registry.build_arg)
    }

    /// Preflight, guard, build and (optionally) push one resolved target
    fn publish_target(&self, engine: &DockerEngine<'_>, target: &BuildTarget) -> Result<PublishOutcome> {
        let connector = &target.connector;

        self.observer
            .phase_started(connector, ReleasePhase::PreflightRuntime);
        let runtime = RuntimeAvailabilityChecker::new(engine).check()?;
        self.observer.phase_finished(
            connector,
            ReleasePhase::PreflightRuntime,
            &format!("{} {}", runtime.engine, runtime.version),
        );

        if self.options.push_requested() {
            self.observer
                .phase_started(connector, ReleasePhase::GuardAgainstExistingPublish);
            let versioned = target.versioned_tag();
            if PublishGuard::new(engine).exists(&versioned)? {
                return Err(ReleaseError::AlreadyPublished { image: versioned }.into());
            }
            self.observer.phase_finished(
                connector,
                ReleasePhase::GuardAgainstExistingPublish,
                &format!("{} not yet published", versioned),
            );
        }

        self.observer.phase_started(connector, ReleasePhase::Build);
        engine.build_with_output(target, &mut |line| {
            self.observer.engine_output(connector, line)
        })?;
        self.observer
            .phase_finished(connector, ReleasePhase::Build, &target.tags().join(", "));

        if !self.options.push_requested() {
            return Ok(PublishOutcome::Built);
        }

        self.observer.phase_started(connector, ReleasePhase::Push);
        engine.push_with_output(target, &mut |line| {
            self.observer.engine_output(connector, line)
        })?;
        self.observer
            .phase_finished(connector, ReleasePhase::Push, &target.image);

        Ok(PublishOutcome::BuiltAndPushed)
    }

    fn abort(&self, report: ReleaseReport, error: HangarError) -> ReleaseAbort {
        error!(error = %error, "could not finish execution");
        ReleaseAbort::new(report, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use hangar_core::testing::ScriptedRunner;
    use hangar_core::{CommandSpec, OutputLine, ProcessOutput, SemanticVersion};
    use tempfile::TempDir;

    const FOO_CHANGELOG: &str = "airbyte-integrations/connectors/source-foo/CHANGELOG.md";
    const DOCKER_VERSION: &str = "Docker version 24.0.7, build afdd53b";

    fn workspace(changelog: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        let dir = temp
            .path()
            .join("airbyte-integrations")
            .join("connectors")
            .join("source-foo");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("CHANGELOG.md"), changelog).unwrap();
        temp
    }

    fn healthy_runner(diff: &str, manifest: ProcessOutput) -> ScriptedRunner {
        ScriptedRunner::new()
            .on("git", &["diff", "--name-only"], ProcessOutput::ok(diff))
            .on("docker", &["--version"], ProcessOutput::ok(DOCKER_VERSION))
            .on("docker", &["version"], ProcessOutput::ok("Server: Docker Engine"))
            .on("docker", &["manifest", "inspect"], manifest)
            .on("docker", &["build"], ProcessOutput::ok("Successfully built"))
            .on("docker", &["push"], ProcessOutput::ok("pushed"))
    }

    fn no_such_manifest() -> ProcessOutput {
        ProcessOutput::failed(1, "no such manifest: docker.io/airbytedotnet/source-foo:1.0.1")
    }

    #[test]
    fn test_builds_and_pushes_new_version() {
        let temp = workspace("### v1.0.1\n- Fix paging\n### v1.0.0\n- Initial\n");
        let runner = healthy_runner(FOO_CHANGELOG, no_such_manifest());
        let config = Config::default();

        let report = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap();

        let builds = runner.calls_to("docker", "build");
        assert_eq!(builds.len(), 1);
        assert_eq!(
            builds[0].args,
            vec![
                "build",
                "--build-arg",
                "BUILD_VERSION=1.0.1",
                "-t",
                "airbytedotnet/source-foo:1.0.1",
                "-t",
                "airbytedotnet/source-foo:latest",
                "."
            ]
        );
        assert_eq!(
            builds[0].working_dir.as_deref(),
            Some(temp.path().join("airbyte-integrations/connectors/source-foo").as_path())
        );

        let pushes = runner.calls_to("docker", "push");
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].args, vec!["push", "-a", "airbytedotnet/source-foo"]);

        assert_eq!(report.connectors.len(), 1);
        assert_eq!(report.connectors[0].outcome, PublishOutcome::BuiltAndPushed);
        assert_eq!(report.connectors[0].version, Some(SemanticVersion::new(1, 0, 1)));
    }

    #[test]
    fn test_phase_order_guard_then_build_then_push() {
        let temp = workspace("### v1.0.1\n");
        let runner = healthy_runner(FOO_CHANGELOG, no_such_manifest());
        let config = Config::default();

        ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap();

        let sequence: Vec<String> = runner
            .calls()
            .iter()
            .map(|c| format!("{} {}", c.program, c.args[0]))
            .collect();
        assert_eq!(
            sequence,
            vec![
                "git diff",
                "docker --version",
                "docker version",
                "docker manifest",
                "docker build",
                "docker push"
            ]
        );
    }

    #[test]
    fn test_existing_manifest_aborts_before_build() {
        let temp = workspace("### v1.0.1\n### v1.0.0\n");
        let runner = healthy_runner(
            FOO_CHANGELOG,
            ProcessOutput::ok(r#"{"schemaVersion": 2, "layers": []}"#),
        );
        let config = Config::default();

        let abort = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap_err();

        assert!(matches!(
            abort.error,
            HangarError::Release(ReleaseError::AlreadyPublished { .. })
        ));
        assert!(abort.to_string().contains("airbytedotnet/source-foo:1.0.1"));
        assert!(runner.calls_to("docker", "build").is_empty());
        assert!(runner.calls_to("docker", "push").is_empty());
        assert_eq!(
            abort.report.connectors[0].outcome,
            PublishOutcome::SkippedAlreadyPublished
        );
    }

    #[test]
    fn test_empty_change_set_is_fatal() {
        let temp = TempDir::new().unwrap();
        let runner = healthy_runner("", no_such_manifest());
        let config = Config::default();

        let abort = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap_err();

        assert!(matches!(
            abort.error,
            HangarError::Release(ReleaseError::NoChanges { .. })
        ));
        assert_eq!(runner.calls().len(), 1);
        assert!(runner.calls_to("docker", "build").is_empty());
        assert!(runner.calls_to("docker", "push").is_empty());
    }

    #[test]
    fn test_empty_change_set_allowed_by_config() {
        let temp = TempDir::new().unwrap();
        let runner = healthy_runner("\n", no_such_manifest());
        let mut config = Config::default();
        config.release.allow_empty = true;

        let report = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_changes_outside_connectors_are_fatal() {
        let temp = TempDir::new().unwrap();
        let runner = healthy_runner("README.md\nsrc/Airbyte.Cdk/Publish.cs\n", no_such_manifest());
        let config = Config::default();

        let abort = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap_err();
        assert!(matches!(
            abort.error,
            HangarError::Release(ReleaseError::NoConnectors { files: 2, .. })
        ));
    }

    #[test]
    fn test_missing_changelog_is_fatal() {
        let temp = TempDir::new().unwrap();
        let runner = healthy_runner(FOO_CHANGELOG, no_such_manifest());
        let config = Config::default();

        let abort = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap_err();
        assert!(matches!(
            abort.error,
            HangarError::Release(ReleaseError::MissingVersion { .. })
        ));
        assert!(abort.report.connectors[0].version.is_none());
        assert!(runner.calls_to("docker", "--version").is_empty());
    }

    #[test]
    fn test_changelog_without_versions_is_fatal() {
        let temp = workspace("# Changelog\n\nNothing yet.\n");
        let runner = healthy_runner(FOO_CHANGELOG, no_such_manifest());
        let config = Config::default();

        let abort = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap_err();
        assert!(matches!(
            abort.error,
            HangarError::Release(ReleaseError::MissingVersion { .. })
        ));
    }

    #[test]
    fn test_build_only_skips_guard_and_push() {
        let temp = workspace("### v1.0.1\n");
        // Manifest exists, but build-only never asks
        let runner = healthy_runner(FOO_CHANGELOG, ProcessOutput::ok("{}"));
        let config = Config::default();

        let report = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::build_only())
            .execute()
            .unwrap();

        assert!(report.build_only);
        assert_eq!(report.connectors[0].outcome, PublishOutcome::Built);
        assert!(runner.calls_to("docker", "manifest").is_empty());
        assert_eq!(runner.calls_to("docker", "build").len(), 1);
        assert!(runner.calls_to("docker", "push").is_empty());
    }

    #[test]
    fn test_runtime_unavailable_aborts_before_build() {
        let temp = workspace("### v1.0.1\n");
        let runner = ScriptedRunner::new()
            .on("git", &["diff"], ProcessOutput::ok(FOO_CHANGELOG))
            .missing("docker");
        let config = Config::default();

        let abort = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap_err();
        assert!(matches!(abort.error, HangarError::Runtime(_)));
        assert!(runner.calls_to("docker", "build").is_empty());
    }

    #[test]
    fn test_build_failure_stops_run() {
        let temp = TempDir::new().unwrap();
        for name in ["source-foo", "source-bar"] {
            let dir = temp.path().join("airbyte-integrations/connectors").join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("CHANGELOG.md"), "## 0.1.0\n").unwrap();
        }
        let runner = ScriptedRunner::new()
            .on(
                "git",
                &["diff"],
                ProcessOutput::ok(
                    "airbyte-integrations/connectors/source-foo/Dockerfile\n\
                     airbyte-integrations/connectors/source-bar/Dockerfile\n",
                ),
            )
            .on("docker", &["--version"], ProcessOutput::ok(DOCKER_VERSION))
            .on("docker", &["version"], ProcessOutput::ok(""))
            .on("docker", &["manifest"], ProcessOutput::failed(1, "no such manifest"))
            .on("docker", &["build"], ProcessOutput::failed(1, "COPY failed"));
        let config = Config::default();

        let abort = ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap_err();

        assert!(matches!(abort.error, HangarError::Adapter(_)));
        assert_eq!(runner.calls_to("docker", "build").len(), 1);
        assert!(runner.calls_to("docker", "push").is_empty());
        assert_eq!(abort.report.connectors.len(), 1);
        assert!(matches!(
            abort.report.connectors[0].outcome,
            PublishOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_custom_registry_and_build_arg() {
        let temp = workspace("### v2.3.4\n");
        let runner = healthy_runner(FOO_CHANGELOG, no_such_manifest());
        let mut config = Config::default();
        config.registry.host = Some("ghcr.io".to_string());
        config.registry.namespace = "acme".to_string();
        config.registry.build_arg = "VERSION".to_string();

        ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .execute()
            .unwrap();

        let build = &runner.calls_to("docker", "build")[0];
        assert!(build.args.contains(&"VERSION=2.3.4".to_string()));
        assert!(build.args.contains(&"ghcr.io/acme/source-foo:2.3.4".to_string()));
        assert_eq!(
            runner.calls_to("docker", "manifest")[0].args[2],
            "ghcr.io/acme/source-foo:2.3.4"
        );
    }

    /// Fake engine + registry: pushed tags become visible to `manifest inspect`.
    #[derive(Default)]
    struct FakeRegistry {
        local_tags: Mutex<Vec<String>>,
        remote_tags: Mutex<HashSet<String>>,
        builds: Mutex<usize>,
    }

    impl ProcessRunner for FakeRegistry {
        fn run(&self, command: &CommandSpec) -> Result<ProcessOutput> {
            let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
            let output = match (command.program.as_str(), args.as_slice()) {
                ("git", ["diff", ..]) => ProcessOutput::ok(FOO_CHANGELOG),
                ("docker", ["--version"]) => ProcessOutput::ok(DOCKER_VERSION),
                ("docker", ["version"]) => ProcessOutput::ok("Server: Docker Engine"),
                ("docker", ["manifest", "inspect", image]) => {
                    if self.remote_tags.lock().unwrap().contains(*image) {
                        ProcessOutput::ok("{\"schemaVersion\": 2}")
                    } else {
                        ProcessOutput::failed(1, format!("no such manifest: {}", image))
                    }
                }
                ("docker", ["build", rest @ ..]) => {
                    *self.builds.lock().unwrap() += 1;
                    let mut tags = self.local_tags.lock().unwrap();
                    for pair in rest.windows(2) {
                        if pair[0] == "-t" {
                            tags.push(pair[1].to_string());
                        }
                    }
                    ProcessOutput::ok("built")
                }
                ("docker", ["push", "-a", image]) => {
                    let prefix = format!("{}:", image);
                    let local = self.local_tags.lock().unwrap();
                    let mut remote = self.remote_tags.lock().unwrap();
                    for tag in local.iter().filter(|t| t.starts_with(&prefix)) {
                        remote.insert(tag.clone());
                    }
                    ProcessOutput::ok("pushed")
                }
                _ => ProcessOutput::failed(127, "unexpected command"),
            };
            Ok(output)
        }
    }

    #[test]
    fn test_second_run_with_same_version_is_rejected() {
        let temp = workspace("### v1.0.1\n### v1.0.0\n");
        let registry = FakeRegistry::default();
        let config = Config::default();
        let orchestrator =
            ReleaseOrchestrator::new(&config, &registry, temp.path(), ReleaseOptions::default());

        let first = orchestrator.execute().unwrap();
        assert_eq!(first.connectors[0].outcome, PublishOutcome::BuiltAndPushed);
        assert_eq!(*registry.builds.lock().unwrap(), 1);

        let second = orchestrator.execute().unwrap_err();
        assert!(matches!(
            second.error,
            HangarError::Release(ReleaseError::AlreadyPublished { .. })
        ));
        assert_eq!(*registry.builds.lock().unwrap(), 1);
    }

    #[test]
    fn test_observer_receives_engine_output() {
        #[derive(Default)]
        struct Lines(Mutex<Vec<String>>);

        impl ReleaseObserver for Lines {
            fn engine_output(&self, connector: &ConnectorId, line: OutputLine<'_>) {
                assert_eq!(connector.as_str(), "source-foo");
                self.0.lock().unwrap().push(line.text().to_string());
            }
        }

        let temp = workspace("### v1.0.1\n");
        let runner = healthy_runner(FOO_CHANGELOG, no_such_manifest());
        let config = Config::default();
        let lines = Lines::default();

        ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .with_observer(&lines)
            .execute()
            .unwrap();

        assert_eq!(
            *lines.0.lock().unwrap(),
            vec!["Successfully built".to_string(), "pushed".to_string()]
        );
    }

    #[test]
    fn test_observer_sees_phases_in_order() {
        #[derive(Default)]
        struct Recorder(Mutex<Vec<ReleasePhase>>);

        impl ReleaseObserver for Recorder {
            fn phase_started(&self, _connector: &ConnectorId, phase: ReleasePhase) {
                self.0.lock().unwrap().push(phase);
            }
        }

        let temp = workspace("### v1.0.1\n");
        let runner = healthy_runner(FOO_CHANGELOG, no_such_manifest());
        let config = Config::default();
        let recorder = Recorder::default();

        ReleaseOrchestrator::new(&config, &runner, temp.path(), ReleaseOptions::default())
            .with_observer(&recorder)
            .execute()
            .unwrap();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                ReleasePhase::Start,
                ReleasePhase::ResolveVersion,
                ReleasePhase::PreflightRuntime,
                ReleasePhase::GuardAgainstExistingPublish,
                ReleasePhase::Build,
                ReleasePhase::Push,
            ]
        );
    }
}
