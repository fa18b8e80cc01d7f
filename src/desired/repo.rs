use std::fmt::Display;

use serde::Deserialize;

use super::error::ValidationError;
use super::package::default_present;

const PPA_PREFIX: &str = "ppa:";
const LAUNCHPAD_HOSTS: [&str; 2] = ["ppa.launchpad.net", "ppa.launchpadcontent.net"];
const SOURCE_TYPES: [&str; 2] = ["deb", "deb-src"];

/// Canonical form of a package source.
///
/// The same source written in different ways (extra spaces, trailing slashes, a launchpad
/// source line instead of its `ppa:` shorthand) always yields the same identifier, so a
/// registered source is recognized on every run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RepoIdentifier {
    /// Personal archive shorthand, `ppa:owner/archive`.
    Ppa { owner: String, archive: String },
    /// A full source line such as `deb [arch=amd64] https://example.org/debian stable main`.
    SourceLine { line: String, url: String },
    /// A bare repository URL.
    Url(String),
}

impl RepoIdentifier {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyRepoIdentifier);
        }
        let invalid = || ValidationError::InvalidRepoIdentifier(trimmed.to_string());

        if let Some(reference) = trimmed.strip_prefix(PPA_PREFIX) {
            return parse_ppa(reference).ok_or_else(invalid);
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.first().is_some_and(|t| SOURCE_TYPES.contains(t)) {
            return parse_source_line(&tokens).ok_or_else(invalid);
        }

        if tokens.len() == 1 && is_url(trimmed) {
            return Ok(Self::Url(strip_trailing_slashes(trimmed).to_string()));
        }

        Err(invalid())
    }

    /// URL the source points at, if it has one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Ppa { .. } => None,
            Self::SourceLine { url, .. } => Some(url),
            Self::Url(url) => Some(url),
        }
    }
}

impl Display for RepoIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ppa { owner, archive } => write!(f, "{}{}/{}", PPA_PREFIX, owner, archive),
            Self::SourceLine { line, .. } => write!(f, "{}", line),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

fn parse_ppa(reference: &str) -> Option<RepoIdentifier> {
    let (owner, archive) = reference.split_once('/')?;
    let valid = |s: &str| {
        !s.is_empty()
            && s.chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
    };
    if !valid(owner) || !valid(archive) {
        return None;
    }
    Some(RepoIdentifier::Ppa {
        owner: owner.to_lowercase(),
        archive: archive.to_lowercase(),
    })
}

fn parse_source_line(tokens: &[&str]) -> Option<RepoIdentifier> {
    let mut canonical: Vec<String> = Vec::with_capacity(tokens.len());
    canonical.push(tokens[0].to_string());

    let mut rest = tokens[1..].iter();
    let mut url = None;
    let mut in_options = false;
    for token in rest.by_ref() {
        if in_options || token.starts_with('[') {
            in_options = !token.ends_with(']');
            canonical.push(token.to_string());
            continue;
        }
        url = Some(strip_trailing_slashes(token));
        break;
    }

    let url = url.filter(|u| is_url(u))?;
    let suite_and_components: Vec<&str> = rest.copied().collect();
    if suite_and_components.is_empty() {
        return None;
    }

    if let Some(ppa) = launchpad_ppa(url) {
        return Some(ppa);
    }

    canonical.push(url.to_string());
    canonical.extend(suite_and_components.iter().map(|s| s.to_string()));
    Some(RepoIdentifier::SourceLine {
        line: canonical.join(" "),
        url: url.to_string(),
    })
}

/// Maps `http(s)://ppa.launchpad(content).net/<owner>/<archive>/...` back to its shorthand.
fn launchpad_ppa(url: &str) -> Option<RepoIdentifier> {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let mut segments = without_scheme.split('/');
    let host = segments.next()?;
    if !LAUNCHPAD_HOSTS.contains(&host) {
        return None;
    }
    let owner = segments.next()?;
    let archive = segments.next()?;
    parse_ppa(&format!("{}/{}", owner, archive))
}

fn is_url(candidate: &str) -> bool {
    if let Some((scheme, rest)) = candidate.split_once(':') {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            && rest.starts_with('/')
    } else {
        false
    }
}

fn strip_trailing_slashes(url: &str) -> &str {
    let stripped = url.trim_end_matches('/');
    if stripped.ends_with(':') {
        url
    } else {
        stripped
    }
}

/// One validated `repo(...)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSpec {
    pub identifier: RepoIdentifier,
    pub present: bool,
}

/// A `repo(...)` call as written by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoRequest {
    pub identifier: String,
    #[serde(default = "default_present")]
    pub present: bool,
}

impl RepoRequest {
    pub fn new(identifier: &str, present: bool) -> Self {
        Self {
            identifier: identifier.to_string(),
            present,
        }
    }
}
