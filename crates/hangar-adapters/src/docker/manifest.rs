//! Registry manifest probe

use tracing::{debug, info};

use hangar_core::error::Result;

use super::DockerEngine;

/// Probe output meaning the tag is not in the registry (or cannot be seen)
const ABSENT_MARKERS: [&str; 2] = [
    "no such manifest",
    "requested access to the resource is denied",
];

/// Refuses to publish a tag that already exists remotely
pub struct PublishGuard<'e, 'a> {
    engine: &'e DockerEngine<'a>,
}

impl<'e, 'a> PublishGuard<'e, 'a> {
    /// Create a guard using `engine` for the probe
    pub fn new(engine: &'e DockerEngine<'a>) -> Self {
        Self { engine }
    }

    /// Whether `image` (a tagged reference) already has a manifest in the registry.
    ///
    /// Runs `manifest inspect`, which only reads from the registry. The exit
    /// status is ignored; only the text decides.
    pub fn exists(&self, image: &str) -> Result<bool> {
        info!(image, "checking registry for existing image");
        let output = self
            .engine
            .run(&self.engine.command().args(["manifest", "inspect", image]))?;

        let text = output.combined();
        let exists = !manifest_absent(&text);
        debug!(image, exists, exit_code = ?output.exit_code, "manifest probe finished");
        Ok(exists)
    }
}

pub(crate) fn manifest_absent(probe_output: &str) -> bool {
    ABSENT_MARKERS
        .iter()
        .any(|marker| probe_output.contains(marker))
}
