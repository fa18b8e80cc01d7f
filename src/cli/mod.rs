use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;
use tracing::info;

use crate::backend::apt::AptConfig;
use crate::config::{ConfigError, ConfigLoader, ConfigLoaderFile, DEFAULT_CONFIG_PATH};
use crate::desired::{DesiredState, ValidationError};
use crate::engine::PlannerOptions;
use crate::logging::LoggingError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read config from {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: ConfigError,
    },
    #[error("invalid desired state: {0}")]
    Validation(#[from] ValidationError),
    #[error("could not initialize logging: `{0}`")]
    LoggingInit(#[from] LoggingError),
}

/// Everything needed to converge the local machine.
#[derive(Debug)]
pub struct RunRequest {
    pub desired: DesiredState,
    pub engine: PlannerOptions,
    pub apt: AptConfig,
    pub dry_run: bool,
}

/// What action was requested from the CLI?
#[derive(Debug)]
pub enum CliCommand {
    /// Converge (or only plan, with `--dry-run`) the configured desired state.
    Run(RunRequest),
    /// Print the parsed arguments and exit.
    PrintDebugInfo(Cli),
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
pub struct Cli {
    #[arg(short, long, default_value_t = String::from(DEFAULT_CONFIG_PATH))]
    config: String,

    /// Read the system state and print the plan without applying it.
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    print_debug_info: bool,
}

impl Cli {
    /// Parses command line arguments and decides how the application runs.
    pub fn init() -> Result<CliCommand, CliError> {
        Self::parse().into_command()
    }

    /// Loads and validates the configuration and initializes logging.
    ///
    /// The desired state is validated before logging is set up or the system is touched, so
    /// a broken config never reaches the backend.
    pub fn into_command(self) -> Result<CliCommand, CliError> {
        if self.print_debug_info {
            return Ok(CliCommand::PrintDebugInfo(self));
        }

        let loader = ConfigLoaderFile::new(&self.config_path());
        let config = loader.load().map_err(|source| CliError::ConfigRead {
            path: loader.path().to_string_lossy().to_string(),
            source,
        })?;
        let desired = config.desired_state()?;

        config.log.try_init()?;
        info!(
            "Starting {} {} with config '{}'",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            loader.path().to_string_lossy()
        );

        Ok(CliCommand::Run(RunRequest {
            desired,
            engine: config.engine,
            apt: config.backend.apt,
            dry_run: self.dry_run,
        }))
    }

    pub fn config_path(&self) -> PathBuf {
        PathBuf::from(&self.config)
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }
}
