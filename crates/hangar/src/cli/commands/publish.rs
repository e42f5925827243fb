//! Publish command

use clap::Args;
use console::style;
use tracing::info;

use hangar_core::{ConnectorId, OutputLine, PublishOutcome, SystemRunner};
use hangar_git::GitRepo;
use hangar_workflow::{
    ReleaseObserver, ReleaseOptions, ReleaseOrchestrator, ReleasePhase, ReleaseReport,
};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Publish the connectors changed by the last commit.
///
/// Uses the last commit to find the connectors to act on, reads each
/// connector's version from its CHANGELOG.md, then builds and pushes the image.
#[derive(Debug, Args)]
pub struct PublishCommand {
    /// Build only, so do not push
    #[arg(short = 'b', long)]
    pub build_only: bool,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(build_only = self.build_only, "executing publish command");
        let cwd = std::env::current_dir()?;
        let config = cli.load_config(&cwd)?;

        let runner = SystemRunner::new();
        let repo = GitRepo::discover(&runner, &cwd)?;

        if self.build_only && cli.show_progress() {
            output::info("---> Running as build only! <---");
        }

        let options = ReleaseOptions {
            build_only: self.build_only,
        };
        let observer = ConsoleObserver {
            enabled: cli.show_progress(),
        };

        let result = ReleaseOrchestrator::new(&config, &runner, repo.root(), options)
            .with_observer(&observer)
            .execute();

        match result {
            Ok(report) => self.output_report(&report, cli),
            Err(abort) => {
                if cli.format == OutputFormat::Json {
                    println!("{}", serde_json::to_string_pretty(&abort.report)?);
                }
                Err(abort.into())
            }
        }
    }

    fn output_report(&self, report: &ReleaseReport, cli: &Cli) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }
                if report.is_empty() {
                    output::warning("No changed files, nothing to release");
                    return Ok(());
                }
                println!();
                for release in &report.connectors {
                    let version = release
                        .version
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    let outcome = match &release.outcome {
                        PublishOutcome::Built => style(release.outcome.as_str()).cyan(),
                        o if o.is_success() => style(o.as_str()).green(),
                        o => style(o.as_str()).red(),
                    };
                    println!(
                        "{}",
                        output::key_value(
                            release.connector.as_str(),
                            &format!("{} ({})", output::version_style().apply_to(version), outcome)
                        )
                    );
                }
                output::success("Release finished");
            }
        }
        Ok(())
    }
}

/// Prints phase transitions to the terminal
struct ConsoleObserver {
    enabled: bool,
}

impl ReleaseObserver for ConsoleObserver {
    fn phase_started(&self, connector: &ConnectorId, phase: ReleasePhase) {
        if !self.enabled {
            return;
        }
        match phase {
            ReleasePhase::Start => output::info(&format!(
                "Processing changes for connector: {}",
                style(connector).bold()
            )),
            ReleasePhase::Done => {}
            other => output::info(&format!("{}...", other.label())),
        }
    }

    fn phase_finished(&self, _connector: &ConnectorId, phase: ReleasePhase, detail: &str) {
        if !self.enabled {
            return;
        }
        match phase {
            ReleasePhase::ResolveVersion => output::success(&format!(
                "Found connector version {}",
                output::version_style().apply_to(detail)
            )),
            ReleasePhase::Build | ReleasePhase::Push => output::success(&format!(
                "{}...done ({})",
                phase.label(),
                output::image_style().apply_to(detail)
            )),
            ReleasePhase::Start | ReleasePhase::Done => {}
            other => output::success(&format!("{}: {}", other.label(), detail)),
        }
    }

    fn engine_output(&self, _connector: &ConnectorId, line: OutputLine<'_>) {
        if self.enabled {
            output::engine_line(line.text());
        }
    }
}
