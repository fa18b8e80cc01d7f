//! Desired state of a target: which packages and repositories must be present or absent, and
//! whether metadata should be refreshed or everything upgraded.
//!
//! Callers describe intent with `packages(...)` and `repo(...)` calls on a
//! [DesiredStateBuilder]; [DesiredStateBuilder::build] normalizes and validates them without
//! touching the system.

pub mod error;
pub mod package;
pub mod refresh;
pub mod repo;

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

pub use error::ValidationError;
pub use package::{PackageRef, PackageSpec, PackagesRequest};
pub use refresh::RefreshDirective;
pub use repo::{RepoIdentifier, RepoRequest, RepoSpec};

/// Validated, normalized intent for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    packages: Vec<PackageSpec>,
    repos: Vec<RepoSpec>,
    refresh: RefreshDirective,
}

impl DesiredState {
    pub fn builder() -> DesiredStateBuilder {
        DesiredStateBuilder::default()
    }

    /// Package specs in declaration order.
    pub fn packages(&self) -> &[PackageSpec] {
        &self.packages
    }

    /// Repository specs in declaration order, one per canonical identifier.
    pub fn repos(&self) -> &[RepoSpec] {
        &self.repos
    }

    pub fn refresh(&self) -> &RefreshDirective {
        &self.refresh
    }
}

#[derive(Debug, Clone, Default)]
pub struct DesiredStateBuilder {
    packages: Vec<PackagesRequest>,
    repos: Vec<RepoRequest>,
}

impl DesiredStateBuilder {
    pub fn packages(mut self, request: PackagesRequest) -> Self {
        self.packages.push(request);
        self
    }

    pub fn repo(mut self, identifier: &str, present: bool) -> Self {
        self.repos.push(RepoRequest::new(identifier, present));
        self
    }

    pub fn with_requests(mut self, packages: &[PackagesRequest], repos: &[RepoRequest]) -> Self {
        self.packages.extend_from_slice(packages);
        self.repos.extend_from_slice(repos);
        self
    }

    pub fn build(self) -> Result<DesiredState, ValidationError> {
        let repos = validate_repos(&self.repos)?;
        let packages = validate_packages(&self.packages)?;

        let refresh = self
            .packages
            .iter()
            .inspect(|request| {
                if request.cache_time.is_some() && !request.update {
                    warn!(
                        packages = ?request.names,
                        "cache_time is ignored because update is not requested"
                    );
                }
            })
            .map(|request| RefreshDirective::new(request.update, request.cache_time, request.upgrade))
            .fold(RefreshDirective::default(), RefreshDirective::merge);

        Ok(DesiredState {
            packages,
            repos,
            refresh,
        })
    }
}

fn validate_packages(requests: &[PackagesRequest]) -> Result<Vec<PackageSpec>, ValidationError> {
    // bare package name -> requested presence
    let mut seen: BTreeMap<String, bool> = BTreeMap::new();
    let mut specs = Vec::with_capacity(requests.len());

    for request in requests {
        let mut names = BTreeSet::new();
        for raw in &request.names {
            let package = PackageRef::new(raw)?;
            match seen.entry(package.name().to_string()) {
                Entry::Occupied(entry) if *entry.get() != request.present => {
                    return Err(ValidationError::ConflictingPackage(entry.key().clone()));
                }
                Entry::Occupied(entry) => {
                    return Err(ValidationError::DuplicatePackage(entry.key().clone()));
                }
                Entry::Vacant(entry) => {
                    entry.insert(request.present);
                }
            }
            names.insert(package);
        }
        specs.push(PackageSpec {
            names,
            present: request.present,
            latest: request.latest && request.present,
        });
    }

    Ok(specs)
}

fn validate_repos(requests: &[RepoRequest]) -> Result<Vec<RepoSpec>, ValidationError> {
    let mut seen: BTreeMap<RepoIdentifier, bool> = BTreeMap::new();
    let mut specs = Vec::with_capacity(requests.len());

    for request in requests {
        let identifier = RepoIdentifier::parse(&request.identifier)?;
        match seen.entry(identifier.clone()) {
            Entry::Occupied(entry) if *entry.get() != request.present => {
                return Err(ValidationError::ConflictingRepo(entry.key().to_string()));
            }
            // same source written twice with the same presence
            Entry::Occupied(_) => continue,
            Entry::Vacant(entry) => {
                entry.insert(request.present);
            }
        }
        specs.push(RepoSpec {
            identifier,
            present: request.present,
        });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tracing_test::traced_test;

    #[test]
    fn build_normalizes_packages_and_repos() {
        let desired = DesiredState::builder()
            .repo("ppa:Example/Test", true)
            .packages(PackagesRequest::new(["Nginx", "curl=7.81.0"]))
            .packages(PackagesRequest::new(["telnet"]).present(false))
            .build()
            .unwrap();

        assert_eq!(desired.repos().len(), 1);
        assert_eq!(desired.repos()[0].identifier.to_string(), "ppa:example/test");
        assert_eq!(desired.packages().len(), 2);

        let names: Vec<String> = desired.packages()[0]
            .names
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, vec!["curl=7.81.0", "nginx"]);
        assert!(!desired.packages()[1].present);
        assert_eq!(*desired.refresh(), RefreshDirective::default());
    }

    #[test]
    fn empty_name_is_rejected() {
        let result = DesiredState::builder()
            .packages(PackagesRequest::new(["nginx", ""]))
            .build();
        assert_matches!(result, Err(ValidationError::EmptyPackageName));
    }

    #[test]
    fn duplicate_name_in_group_is_rejected() {
        let result = DesiredState::builder()
            .packages(PackagesRequest::new(["nginx", "NGINX"]))
            .build();
        assert_eq!(
            result,
            Err(ValidationError::DuplicatePackage("nginx".to_string()))
        );
    }

    #[test]
    fn pinned_and_unpinned_same_package_is_a_duplicate() {
        let result = DesiredState::builder()
            .packages(PackagesRequest::new(["nginx"]))
            .packages(PackagesRequest::new(["nginx=1.18.0"]))
            .build();
        assert_eq!(
            result,
            Err(ValidationError::DuplicatePackage("nginx".to_string()))
        );
    }

    #[test]
    fn present_and_absent_same_package_is_rejected() {
        let result = DesiredState::builder()
            .packages(PackagesRequest::new(["nginx"]))
            .packages(PackagesRequest::new(["nginx"]).present(false))
            .build();
        assert_eq!(
            result,
            Err(ValidationError::ConflictingPackage("nginx".to_string()))
        );
    }

    #[test]
    fn contradictory_repos_are_rejected() {
        let result = DesiredState::builder()
            .repo("ppa:example/test", true)
            .repo("deb http://ppa.launchpad.net/example/test/ubuntu jammy main", false)
            .build();
        assert_eq!(
            result,
            Err(ValidationError::ConflictingRepo("ppa:example/test".to_string()))
        );
    }

    #[test]
    fn repeated_repo_with_same_presence_is_kept_once() {
        let desired = DesiredState::builder()
            .repo("https://deb.example.org/debian", true)
            .repo("https://deb.example.org/debian/", true)
            .build()
            .unwrap();
        assert_eq!(desired.repos().len(), 1);
    }

    #[test]
    fn latest_only_applies_to_present_specs() {
        let desired = DesiredState::builder()
            .packages(PackagesRequest::new(["telnet"]).present(false).latest(true))
            .build()
            .unwrap();
        assert!(!desired.packages()[0].latest);
    }

    #[test]
    fn refresh_directives_are_merged() {
        let desired = DesiredState::builder()
            .packages(PackagesRequest::new(["nginx"]).update(true).cache_time(3600))
            .packages(PackagesRequest::new(["curl"]).upgrade(true))
            .build()
            .unwrap();
        assert_eq!(
            *desired.refresh(),
            RefreshDirective::new(true, Some(3600), true)
        );
    }

    #[traced_test]
    #[test]
    fn cache_time_without_update_is_ignored_with_a_warning() {
        let desired = DesiredState::builder()
            .packages(PackagesRequest::new(["nginx"]).cache_time(3600))
            .build()
            .unwrap();
        assert_eq!(*desired.refresh(), RefreshDirective::default());
        assert!(logs_contain(
            "cache_time is ignored because update is not requested"
        ));
    }
}
