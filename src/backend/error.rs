use thiserror::Error;

/// Failures reported by a package backend. Messages are kept as the backend produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("package backend unavailable: `{0}`")]
    Unavailable(String),

    #[error("repository registration failed: `{0}`")]
    RepoRegistration(String),

    #[error("repository deregistration failed: `{0}`")]
    RepoDeregistration(String),

    #[error("metadata refresh failed: `{0}`")]
    Refresh(String),

    #[error("package install failed: `{0}`")]
    Install(String),

    #[error("package removal failed: `{0}`")]
    Remove(String),

    #[error("package upgrade failed: `{0}`")]
    Upgrade(String),
}
