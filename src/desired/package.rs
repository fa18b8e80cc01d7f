use std::collections::BTreeSet;
use std::fmt::Display;

use serde::Deserialize;

use super::error::ValidationError;

const VERSION_SEPARATOR: char = '=';

/// A package name, optionally pinned to an exact version (`name=version`).
///
/// Names are trimmed and lower-cased so that `Nginx` and `nginx` refer to the same package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageRef {
    name: String,
    version: Option<String>,
}

impl PackageRef {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        Self::try_from(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn is_pinned(&self) -> bool {
        self.version.is_some()
    }
}

impl TryFrom<&str> for PackageRef {
    type Error = ValidationError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPackageName);
        }

        let (name, version) = match trimmed.split_once(VERSION_SEPARATOR) {
            Some((name, version)) => {
                let version = version.trim();
                if version.is_empty() || version.contains(char::is_whitespace) {
                    return Err(ValidationError::InvalidVersionPin(trimmed.to_string()));
                }
                (name.trim(), Some(version.to_string()))
            }
            None => (trimmed, None),
        };

        if name.is_empty() {
            return Err(ValidationError::EmptyPackageName);
        }
        if name.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidPackageName(trimmed.to_string()));
        }

        Ok(Self {
            name: name.to_lowercase(),
            version,
        })
    }
}

impl Display for PackageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}{}{}", self.name, VERSION_SEPARATOR, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One validated `packages(...)` call: a set of packages that must all be present or all absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub names: BTreeSet<PackageRef>,
    pub present: bool,
    /// Upgrade the already installed, unpinned packages of this spec to the newest candidate.
    pub latest: bool,
}

/// A `packages(...)` call as written by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagesRequest {
    pub names: Vec<String>,
    #[serde(default = "default_present")]
    pub present: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub cache_time: Option<i64>,
    #[serde(default)]
    pub upgrade: bool,
    #[serde(default)]
    pub latest: bool,
}

pub(crate) fn default_present() -> bool {
    true
}

impl PackagesRequest {
    /// Requests the given packages to be installed, with no refresh or upgrade directives.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            present: true,
            update: false,
            cache_time: None,
            upgrade: false,
            latest: false,
        }
    }

    pub fn present(mut self, present: bool) -> Self {
        self.present = present;
        self
    }

    pub fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn cache_time(mut self, seconds: i64) -> Self {
        self.cache_time = Some(seconds);
        self
    }

    pub fn upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade = upgrade;
        self
    }

    pub fn latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }
}
