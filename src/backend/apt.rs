//! Debian/Ubuntu backend built on `dpkg-query`, `apt-get` and `add-apt-repository`.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use super::command::{CommandRunner, CommandSpec, ProcessRunner};
use super::sources;
use super::{BackendError, InstalledPackages, Outcome, PackageBackend};
use crate::desired::{PackageRef, RepoIdentifier};

const INSTALLED_FORMAT: &str = "--showformat=${Package}\\t${Version}\\t${Status}\\n";
const NOTHING_CHANGED: &str = "0 upgraded, 0 newly installed, 0 to remove";
const ONE_LINE_EXTENSION: &str = "list";
const DEB822_EXTENSION: &str = "sources";
/// Keep existing config files instead of prompting when a package ships a new one.
const DPKG_OPTIONS: [&str; 4] = [
    "-o",
    "Dpkg::Options::=--force-confdef",
    "-o",
    "Dpkg::Options::=--force-confold",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AptConfig {
    pub apt_get: String,
    pub dpkg_query: String,
    pub add_apt_repository: String,
    pub sources_list: PathBuf,
    pub sources_dir: PathBuf,
    /// File touched by apt after every successful metadata update.
    pub update_stamp: PathBuf,
}

impl Default for AptConfig {
    fn default() -> Self {
        Self {
            apt_get: "apt-get".to_string(),
            dpkg_query: "dpkg-query".to_string(),
            add_apt_repository: "add-apt-repository".to_string(),
            sources_list: PathBuf::from("/etc/apt/sources.list"),
            sources_dir: PathBuf::from("/etc/apt/sources.list.d"),
            update_stamp: PathBuf::from("/var/lib/apt/periodic/update-success-stamp"),
        }
    }
}

pub struct AptBackend<C = ProcessRunner> {
    config: AptConfig,
    runner: C,
}

impl AptBackend<ProcessRunner> {
    pub fn new(config: AptConfig) -> Self {
        Self::with_runner(config, ProcessRunner)
    }
}

impl<C: CommandRunner> AptBackend<C> {
    pub fn with_runner(config: AptConfig, runner: C) -> Self {
        Self { config, runner }
    }

    fn apt_get(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::new(&self.config.apt_get)
            .args(args.iter().copied())
            .env("DEBIAN_FRONTEND", "noninteractive")
    }

    /// `apt-get` invocation that runs dpkg and must never wait for an answer.
    fn apt_get_dpkg(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::new(&self.config.apt_get)
            .args(DPKG_OPTIONS)
            .args(args.iter().copied())
            .env("DEBIAN_FRONTEND", "noninteractive")
    }

    /// Marks a successful metadata update. apt only touches the stamp itself when
    /// update-notifier is installed.
    fn touch_update_stamp(&self) -> Result<(), std::io::Error> {
        let stamp = &self.config.update_stamp;
        if let Some(parent) = stamp.parent() {
            fs::create_dir_all(parent)?;
        }
        File::options()
            .create(true)
            .write(true)
            .truncate(false)
            .open(stamp)?
            .set_modified(SystemTime::now())
    }

    fn add_apt_repository(&self, identifier: &RepoIdentifier, remove: bool) -> CommandSpec {
        let command = CommandSpec::new(&self.config.add_apt_repository).arg("--yes");
        let command = if remove {
            command.arg("--remove")
        } else {
            command.arg("--no-update")
        };
        command.arg(identifier.to_string())
    }

    fn source_files(&self) -> Result<Vec<PathBuf>, std::io::Error> {
        let mut files = Vec::new();
        if self.config.sources_list.is_file() {
            files.push(self.config.sources_list.clone());
        }
        if self.config.sources_dir.is_dir() {
            let mut listed: Vec<PathBuf> = fs::read_dir(&self.config.sources_dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| {
                    path.extension()
                        .is_some_and(|ext| ext == ONE_LINE_EXTENSION || ext == DEB822_EXTENSION)
                })
                .collect();
            listed.sort();
            files.extend(listed);
        }
        Ok(files)
    }
}

impl<C: CommandRunner> PackageBackend for AptBackend<C> {
    fn list_installed_packages(&self) -> Result<InstalledPackages, BackendError> {
        let command = CommandSpec::new(&self.config.dpkg_query)
            .arg("--show")
            .arg(INSTALLED_FORMAT);
        let output = self
            .runner
            .run(&command)
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;
        Ok(parse_installed(&output))
    }

    fn list_registered_repos(&self) -> Result<BTreeSet<RepoIdentifier>, BackendError> {
        let mut repos = BTreeSet::new();
        let files = self
            .source_files()
            .map_err(|err| BackendError::Unavailable(err.to_string()))?;
        for file in files {
            let content = fs::read_to_string(&file).map_err(|err| {
                BackendError::Unavailable(format!("{}: {}", file.to_string_lossy(), err))
            })?;
            repos.extend(parse_sources(&file, &content));
        }
        Ok(repos)
    }

    fn last_metadata_refresh_at(&self) -> Option<DateTime<Utc>> {
        fs::metadata(&self.config.update_stamp)
            .and_then(|metadata| metadata.modified())
            .map(DateTime::<Utc>::from)
            .map_err(|err| {
                debug!(
                    stamp = %self.config.update_stamp.to_string_lossy(),
                    "last metadata refresh unknown: {}", err
                )
            })
            .ok()
    }

    fn register_repo(&mut self, identifier: &RepoIdentifier) -> Result<Outcome, BackendError> {
        self.runner
            .run(&self.add_apt_repository(identifier, false))
            .map_err(|err| BackendError::RepoRegistration(err.to_string()))?;
        Ok(Outcome::changed(format!("registered {}", identifier)))
    }

    fn deregister_repo(&mut self, identifier: &RepoIdentifier) -> Result<Outcome, BackendError> {
        self.runner
            .run(&self.add_apt_repository(identifier, true))
            .map_err(|err| BackendError::RepoDeregistration(err.to_string()))?;
        Ok(Outcome::changed(format!("deregistered {}", identifier)))
    }

    fn refresh_metadata(&mut self) -> Result<Outcome, BackendError> {
        self.runner
            .run(&self.apt_get(&["update"]))
            .map_err(|err| BackendError::Refresh(err.to_string()))?;
        if let Err(err) = self.touch_update_stamp() {
            warn!(
                stamp = %self.config.update_stamp.to_string_lossy(),
                "could not record metadata refresh: {}", err
            );
        }
        Ok(Outcome::changed("metadata refreshed"))
    }

    fn install_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError> {
        let command = self
            .apt_get_dpkg(&["install", "--yes"])
            .args(packages.iter().map(ToString::to_string));
        let output = self
            .runner
            .run(&command)
            .map_err(|err| BackendError::Install(err.to_string()))?;
        Ok(summarize(&output, format!("installed {} packages", packages.len())))
    }

    fn remove_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError> {
        let command = self
            .apt_get_dpkg(&["remove", "--yes"])
            .args(packages.iter().map(|p| p.name().to_string()));
        let output = self
            .runner
            .run(&command)
            .map_err(|err| BackendError::Remove(err.to_string()))?;
        Ok(summarize(&output, format!("removed {} packages", packages.len())))
    }

    fn upgrade_packages(&mut self, packages: &[PackageRef]) -> Result<Outcome, BackendError> {
        let command = self
            .apt_get_dpkg(&["install", "--yes", "--only-upgrade"])
            .args(packages.iter().map(|p| p.name().to_string()));
        let output = self
            .runner
            .run(&command)
            .map_err(|err| BackendError::Upgrade(err.to_string()))?;
        Ok(summarize(&output, format!("upgraded {} packages", packages.len())))
    }

    fn upgrade_all(&mut self) -> Result<Outcome, BackendError> {
        let output = self
            .runner
            .run(&self.apt_get_dpkg(&["upgrade", "--yes"]))
            .map_err(|err| BackendError::Upgrade(err.to_string()))?;
        Ok(summarize(&output, "upgraded installed packages".to_string()))
    }
}

fn parse_installed(output: &str) -> InstalledPackages {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let name = fields.next()?.trim();
            let version = fields.next()?.trim();
            let status = fields.next()?;
            (!name.is_empty() && status.split_whitespace().last() == Some("installed"))
                .then(|| (name.to_lowercase(), version.to_string()))
        })
        .collect()
}

/// Sources of a `.list` or deb822 `.sources` file. Every source also registers its bare
/// URL, so that a URL-only request matches the source it points at.
fn parse_sources(file: &Path, content: &str) -> Vec<RepoIdentifier> {
    let entries = if file.extension().is_some_and(|ext| ext == DEB822_EXTENSION) {
        sources::deb822_entries(content)
    } else {
        sources::one_line_entries(content)
    };

    let mut repos = Vec::new();
    for entry in entries {
        match RepoIdentifier::parse(&entry) {
            Ok(identifier) => {
                if let Some(url) = identifier.url() {
                    repos.push(RepoIdentifier::Url(url.to_string()));
                }
                repos.push(identifier);
            }
            Err(err) => warn!(file = %file.to_string_lossy(), "skipping source line: {}", err),
        }
    }
    repos
}

/// Uses apt's `N upgraded, N newly installed, ...` line as the outcome detail when present.
fn summarize(output: &str, fallback: String) -> Outcome {
    match output
        .lines()
        .map(str::trim)
        .find(|line| line.contains(" upgraded, ") && line.contains(" newly installed"))
    {
        Some(summary) if summary.starts_with(NOTHING_CHANGED) => Outcome::unchanged(summary),
        Some(summary) => Outcome::changed(summary),
        None => Outcome::changed(fallback),
    }
}
