pub mod config;
pub mod format;

pub use config::{LoggingConfig, LoggingError};
