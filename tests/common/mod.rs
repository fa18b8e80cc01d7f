use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use pkg_converge::backend::{BackendError, InstalledPackages, Outcome, PackageBackend};
use pkg_converge::desired::{PackageRef, RepoIdentifier};

pub const DEFAULT_VERSION: &str = "1.0";

/// In-memory machine: applying a step changes its state the way a real package manager would.
#[derive(Debug, Default)]
pub struct FakeBackend {
    pub installed: InstalledPackages,
    pub repos: BTreeSet<RepoIdentifier>,
    pub last_refresh_at: Option<DateTime<Utc>>,
    /// Time stamped on refreshes.
    pub clock: DateTime<Utc>,
    /// Install requests fail with this message when set.
    pub install_failure: Option<String>,
    /// Backend operations issued, in order.
    pub calls: Vec<String>,
}

impl FakeBackend {
    pub fn new(clock: DateTime<Utc>) -> Self {
        Self {
            clock,
            ..Default::default()
        }
    }

    pub fn with_installed(mut self, packages: &[(&str, &str)]) -> Self {
        self.installed.extend(
            packages
                .iter()
                .map(|(name, version)| (name.to_string(), version.to_string())),
        );
        self
    }

    pub fn with_repo(mut self, identifier: &str) -> Self {
        self.repos.insert(repo(identifier));
        self
    }

    pub fn with_last_refresh(mut self, at: DateTime<Utc>) -> Self {
        self.last_refresh_at = Some(at);
        self
    }

    pub fn failing_install(mut self, message: &str) -> Self {
        self.install_failure = Some(message.to_string());
        self
    }
}

impl PackageBackend for FakeBackend {
    fn list_installed_packages(&self) -> Result<InstalledPackages, BackendError> {
        Ok(self.installed.clone())
    }

    fn list_registered_repos(&self) -> Result<BTreeSet<RepoIdentifier>, BackendError> {
        Ok(self.repos.clone())
    }

    fn last_metadata_refresh_at(&self) -> Option<DateTime<Utc>> {
        self.last_refresh_at
    }

    fn register_repo(&mut self, identifier: &RepoIdentifier) -> Result<Outcome, BackendError> {
        self.calls.push(format!("register {}", identifier));
        self.repos.insert(identifier.clone());
        Ok(Outcome::changed(format!("registered {}", identifier)))
    }

    fn deregister_repo(&mut self, identifier: &RepoIdentifier) -> Result<Outcome, BackendError> {
        self.calls.push(format!("deregister {}", identifier));
        self.repos.remove(identifier);
        Ok(Outcome::changed(format!("deregistered {}", identifier)))
    }

    fn refresh_metadata(&mut self) -> Result<Outcome, BackendError> {
        self.calls.push("refresh".to_string());
        self.last_refresh_at = Some(self.clock);
        Ok(Outcome::changed("metadata refreshed"))
    }

    fn install_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError> {
        self.calls.push(format!("install {}", join(packages)));
        if let Some(message) = &self.install_failure {
            return Err(BackendError::Install(message.clone()));
        }
        for package in packages {
            self.installed.insert(
                package.name().to_string(),
                package.version().unwrap_or(DEFAULT_VERSION).to_string(),
            );
        }
        Ok(Outcome::changed(format!("installed {} packages", packages.len())))
    }

    fn remove_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError> {
        self.calls.push(format!("remove {}", join(packages)));
        for package in packages {
            self.installed.remove(package.name());
        }
        Ok(Outcome::changed(format!("removed {} packages", packages.len())))
    }

    fn upgrade_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError> {
        self.calls.push(format!("upgrade {}", join(packages)));
        Ok(Outcome::unchanged("already at the newest version"))
    }

    fn upgrade_all(&mut self) -> Result<Outcome, BackendError> {
        self.calls.push("upgrade all".to_string());
        Ok(Outcome::unchanged("0 upgraded, 0 newly installed, 0 to remove"))
    }
}

pub fn repo(identifier: &str) -> RepoIdentifier {
    RepoIdentifier::parse(identifier).unwrap()
}

pub fn refs(names: &[&str]) -> Vec<PackageRef> {
    names.iter().map(|n| PackageRef::new(n).unwrap()).collect()
}

fn join(packages: &[PackageRef]) -> String {
    packages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
