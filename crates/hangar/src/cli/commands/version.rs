//! Version command

use std::path::Path;

use clap::Args;
use serde::Serialize;
use tracing::info;

use hangar_core::config::Config;
use hangar_core::{BuildTarget, ConnectorId, SystemRunner};
use hangar_git::GitRepo;
use hangar_workflow::{ReleaseOptions, ReleaseOrchestrator};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Show the version and tags a connector would be released with
#[derive(Debug, Args)]
pub struct VersionCommand {
    /// Connector directory name, e.g. source-stripe
    pub connector: String,
}

/// JSON shape of the version command
#[derive(Debug, Serialize)]
struct VersionInfo {
    connector: String,
    version: String,
    image: String,
    tags: Vec<String>,
}

impl From<&BuildTarget> for VersionInfo {
    fn from(target: &BuildTarget) -> Self {
        Self {
            connector: target.connector.to_string(),
            version: target.version.to_string(),
            image: target.image.clone(),
            tags: target.tags().to_vec(),
        }
    }
}

impl VersionCommand {
    /// Execute the version command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(connector = %self.connector, "executing version command");
        let cwd = std::env::current_dir()?;
        let config = cli.load_config(&cwd)?;

        let runner = SystemRunner::new();
        let repo = GitRepo::discover(&runner, &cwd)?;

        let target = resolve(&config, repo.root(), &self.connector)?;
        self.output_target(&target, cli)
    }

    fn output_target(&self, target: &BuildTarget, cli: &Cli) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&VersionInfo::from(target))?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    println!("{}", target.version);
                    return Ok(());
                }
                println!(
                    "{}",
                    output::key_value("Connector", target.connector.as_str())
                );
                println!(
                    "{}",
                    output::key_value(
                        "Version",
                        &output::version_style().apply_to(target.version).to_string()
                    )
                );
                for tag in target.tags() {
                    println!(
                        "{}",
                        output::key_value("Tag", &output::image_style().apply_to(tag).to_string())
                    );
                }
            }
        }
        Ok(())
    }
}

/// Resolve a connector's target without touching git or the engine
fn resolve(config: &Config, repo_root: &Path, connector: &str) -> anyhow::Result<BuildTarget> {
    let runner = SystemRunner::new();
    let orchestrator = ReleaseOrchestrator::new(config, &runner, repo_root, ReleaseOptions::default());
    let target = orchestrator.resolve_target(&ConnectorId::new(connector))?;
    Ok(target)
}
