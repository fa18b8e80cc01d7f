use serde::Deserialize;
use std::fmt::Debug;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::PrettyFields;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use super::format::LoggingFormat;

const LOG_LEVEL_ENV_VAR: &str = "LOG_LEVEL";

/// An enum representing possible errors during the logging initialization.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("init logging error: `{0}`")]
    TryInitError(String),
    #[error("invalid logging directive: `{0}`")]
    InvalidDirective(String),
}

/// Defines the logging configuration for an application.
///
/// # Fields:
/// - `format`: Specifies the `LoggingFormat` the application will use for logging.
/// - `level`: Level applied to this crate's events. `LOG_LEVEL` overrides it.
#[derive(Debug, Deserialize, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub(crate) format: LoggingFormat,
    #[serde(default)]
    pub(crate) level: LogLevel,
}

impl LoggingConfig {
    /// Attempts to initialize the logging subscriber with the inner configuration.
    pub fn try_init(&self) -> Result<(), LoggingError> {
        tracing_subscriber::fmt()
            .with_writer(std::io::stdout)
            .with_target(self.format.target)
            .with_timer(ChronoLocal::new(self.format.timestamp.0.clone()))
            .fmt_fields(PrettyFields::new())
            .with_env_filter(self.logging_filter()?)
            .try_init()
            .map_err(|_| {
                LoggingError::TryInitError("unable to set global logging subscriber".to_string())
            })?;

        debug!("Logging initialized successfully");
        Ok(())
    }

    fn logging_filter(&self) -> Result<EnvFilter, LoggingError> {
        let level = self.level.as_level().to_string().to_lowercase();
        let directive = format!("{}={}", env!("CARGO_CRATE_NAME"), level);
        let crate_directive = directive
            .parse::<Directive>()
            .map_err(|_| LoggingError::InvalidDirective(directive))?;

        Ok(EnvFilter::builder()
            .with_default_directive(crate_directive)
            .with_env_var(LOG_LEVEL_ENV_VAR)
            .from_env_lossy())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub(crate) struct LogLevel(Level);

impl LogLevel {
    fn as_level(&self) -> Level {
        self.0
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self(Level::INFO)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value_str = String::deserialize(deserializer)?;
        Level::from_str(&value_str)
            .map(LogLevel)
            .map_err(serde::de::Error::custom)
    }
}
