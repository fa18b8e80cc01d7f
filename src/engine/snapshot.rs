use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::backend::{BackendError, InstalledPackages, PackageBackend};
use crate::desired::{PackageRef, RepoIdentifier};

/// Observed state of the target, read once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSnapshot {
    pub installed: InstalledPackages,
    pub repos: BTreeSet<RepoIdentifier>,
    pub last_refresh_at: Option<DateTime<Utc>>,
}

impl StateSnapshot {
    pub fn read<B: PackageBackend + ?Sized>(backend: &B) -> Result<Self, BackendError> {
        let snapshot = Self {
            installed: backend.list_installed_packages()?,
            repos: backend.list_registered_repos()?,
            last_refresh_at: backend.last_metadata_refresh_at(),
        };
        debug!(
            installed = snapshot.installed.len(),
            repos = snapshot.repos.len(),
            last_refresh_at = ?snapshot.last_refresh_at,
            "read system state"
        );
        Ok(snapshot)
    }

    /// Whether the package is installed, at the pinned version if it has one.
    pub fn has_installed(&self, package: &PackageRef) -> bool {
        match (self.installed.get(package.name()), package.version()) {
            (Some(installed), Some(pinned)) => installed == pinned,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Whether any version of the package is installed.
    pub fn has_name_installed(&self, package: &PackageRef) -> bool {
        self.installed.contains_key(package.name())
    }

    pub fn is_registered(&self, identifier: &RepoIdentifier) -> bool {
        self.repos.contains(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::MockPackageBackend;
    use assert_matches::assert_matches;

    fn snapshot() -> StateSnapshot {
        StateSnapshot {
            installed: InstalledPackages::from([("nginx".to_string(), "1.18.0".to_string())]),
            ..Default::default()
        }
    }

    #[test]
    fn installed_respects_version_pins() {
        let snapshot = snapshot();
        assert!(snapshot.has_installed(&PackageRef::new("nginx").unwrap()));
        assert!(snapshot.has_installed(&PackageRef::new("nginx=1.18.0").unwrap()));
        assert!(!snapshot.has_installed(&PackageRef::new("nginx=1.20.0").unwrap()));
        assert!(snapshot.has_name_installed(&PackageRef::new("nginx=1.20.0").unwrap()));
        assert!(!snapshot.has_installed(&PackageRef::new("curl").unwrap()));
    }

    #[test]
    fn read_collects_backend_state() {
        let mut backend = MockPackageBackend::new();
        let ppa = RepoIdentifier::parse("ppa:example/test").unwrap();
        let refreshed = Utc::now();
        backend.should_read_state(
            snapshot().installed,
            BTreeSet::from([ppa.clone()]),
            Some(refreshed),
        );

        let read = StateSnapshot::read(&backend).unwrap();
        assert_eq!(read.installed, snapshot().installed);
        assert!(read.is_registered(&ppa));
        assert_eq!(read.last_refresh_at, Some(refreshed));
    }

    #[test]
    fn read_fails_when_backend_is_unavailable() {
        let mut backend = MockPackageBackend::new();
        backend
            .expect_list_installed_packages()
            .times(1)
            .returning(|| Err(BackendError::Unavailable("dpkg lock".to_string())));
        backend.expect_list_registered_repos().never();

        assert_matches!(
            StateSnapshot::read(&backend),
            Err(BackendError::Unavailable(_))
        );
    }
}
