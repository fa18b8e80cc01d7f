//! Configuration file: desired packages and repositories plus engine, backend and logging
//! settings.

pub mod error;
pub mod loader;

use serde::Deserialize;

use crate::backend::apt::AptConfig;
use crate::desired::{DesiredState, PackagesRequest, RepoRequest, ValidationError};
use crate::engine::PlannerOptions;
use crate::logging::LoggingConfig;

pub use error::ConfigError;
pub use loader::{ConfigLoader, ConfigLoaderFile};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/pkg-converge/config.yaml";

#[derive(Debug, Deserialize, Default, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    #[serde(default)]
    pub apt: AptConfig,
}

#[derive(Debug, Deserialize, Default, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConvergeConfig {
    #[serde(default)]
    pub log: LoggingConfig,

    #[serde(default)]
    pub engine: PlannerOptions,

    #[serde(default)]
    pub backend: BackendConfig,

    /// `repo(...)` calls, in declaration order.
    #[serde(default)]
    pub repos: Vec<RepoRequest>,

    /// `packages(...)` calls, in declaration order.
    #[serde(default)]
    pub packages: Vec<PackagesRequest>,
}

impl ConvergeConfig {
    pub fn desired_state(&self) -> Result<DesiredState, ValidationError> {
        DesiredState::builder()
            .with_requests(&self.packages, &self.repos)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::path::PathBuf;

    const EXAMPLE_CONFIG: &str = r#"
log:
  level: debug
engine:
  refresh_on_deregister: true
backend:
  apt:
    apt_get: /usr/bin/apt-get
    update_stamp: /tmp/stamp
repos:
  - identifier: "ppa:example/test"
  - identifier: "https://old.example.org/debian"
    present: false
packages:
  - names: [nginx, curl]
    update: true
    cache_time: 3600
  - names: [telnet]
    present: false
"#;

    #[test]
    fn example_config() {
        let config: ConvergeConfig = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();

        assert!(config.engine.refresh_on_deregister);
        assert_eq!(config.backend.apt.apt_get, "/usr/bin/apt-get");
        assert_eq!(config.backend.apt.update_stamp, PathBuf::from("/tmp/stamp"));
        assert_eq!(config.backend.apt.dpkg_query, "dpkg-query");
        assert_eq!(
            config.repos,
            vec![
                RepoRequest::new("ppa:example/test", true),
                RepoRequest::new("https://old.example.org/debian", false),
            ]
        );
        assert_eq!(
            config.packages,
            vec![
                PackagesRequest::new(["nginx", "curl"])
                    .update(true)
                    .cache_time(3600),
                PackagesRequest::new(["telnet"]).present(false),
            ]
        );

        let desired = config.desired_state().unwrap();
        assert_eq!(desired.repos().len(), 2);
        assert_eq!(desired.packages().len(), 2);
        assert_eq!(desired.refresh().cache_time_seconds, Some(3600));
    }

    #[test]
    fn empty_config_is_empty_desired_state() {
        let config: ConvergeConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ConvergeConfig::default());
        assert_eq!(config.desired_state().unwrap(), DesiredState::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<ConvergeConfig>("random_field: value").is_err());
        assert!(serde_yaml::from_str::<ConvergeConfig>("engine:\n  parallel: true").is_err());
        assert!(serde_yaml::from_str::<ConvergeConfig>("backend:\n  yum: {}").is_err());
    }

    #[test]
    fn invalid_desired_state_surfaces_validation_error() {
        let config: ConvergeConfig = serde_yaml::from_str(
            r#"
packages:
  - names: [nginx]
  - names: [nginx]
    present: false
"#,
        )
        .unwrap();
        assert_matches!(
            config.desired_state(),
            Err(ValidationError::ConflictingPackage(name)) if name == "nginx"
        );
    }
}
