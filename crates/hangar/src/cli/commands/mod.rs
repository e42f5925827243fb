//! CLI commands

mod completions;
mod publish;
mod version;

pub use completions::CompletionsCommand;
pub use publish::PublishCommand;
pub use version::VersionCommand;
