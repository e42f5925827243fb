//! Hangar Changelog - Version resolution from connector changelogs
//!
//! Changelogs are free-form markdown. The release version is the highest
//! `major.minor.patch` token found anywhere in the file.

mod resolver;

pub use resolver::{highest_version, VersionResolver};
