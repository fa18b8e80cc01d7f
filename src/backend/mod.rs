//! The package backend capability the engine drives.
//!
//! A backend knows how to read the installed packages, the registered sources and the last
//! metadata refresh of a machine, and how to change them. The engine never shells out itself.

pub mod apt;
pub mod command;
pub mod error;
mod sources;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use chrono::{DateTime, Utc};

use crate::desired::{PackageRef, RepoIdentifier};
pub use error::BackendError;

/// Installed package name -> installed version.
pub type InstalledPackages = BTreeMap<String, String>;

/// What a backend reports after applying one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub changed: bool,
    pub detail: String,
}

impl Outcome {
    pub fn changed<S: Into<String>>(detail: S) -> Self {
        Self {
            changed: true,
            detail: detail.into(),
        }
    }

    pub fn unchanged<S: Into<String>>(detail: S) -> Self {
        Self {
            changed: false,
            detail: detail.into(),
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.detail)
    }
}

pub trait PackageBackend {
    /// Fails with [BackendError::Unavailable] when the package database cannot be read.
    fn list_installed_packages(&self) -> Result<InstalledPackages, BackendError>;

    /// Registered sources, in canonical form.
    fn list_registered_repos(&self) -> Result<BTreeSet<RepoIdentifier>, BackendError>;

    /// `None` when the metadata was never refreshed or the time is unknown.
    fn last_metadata_refresh_at(&self) -> Option<DateTime<Utc>>;

    fn register_repo(&mut self, identifier: &RepoIdentifier) -> Result<Outcome, BackendError>;

    fn deregister_repo(&mut self, identifier: &RepoIdentifier) -> Result<Outcome, BackendError>;

    fn refresh_metadata(&mut self) -> Result<Outcome, BackendError>;

    fn install_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError>;

    fn remove_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError>;

    /// Upgrades the given installed packages to their newest candidate.
    fn upgrade_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError>;

    fn upgrade_all(&mut self) -> Result<Outcome, BackendError>;
}
