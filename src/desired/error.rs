use thiserror::Error;

/// Errors found while normalizing the requested state, before anything touches the system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("package name cannot be empty")]
    EmptyPackageName,

    #[error("invalid package name `{0}`")]
    InvalidPackageName(String),

    #[error("invalid version pin in `{0}`")]
    InvalidVersionPin(String),

    #[error("package `{0}` is listed more than once")]
    DuplicatePackage(String),

    #[error("package `{0}` is requested both present and absent")]
    ConflictingPackage(String),

    #[error("repository identifier cannot be empty")]
    EmptyRepoIdentifier,

    #[error("unrecognized repository identifier `{0}`")]
    InvalidRepoIdentifier(String),

    #[error("repository `{0}` is requested both present and absent")]
    ConflictingRepo(String),
}
