use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::ConvergeConfig;

pub trait ConfigLoader {
    fn load(&self) -> Result<ConvergeConfig, ConfigError>;
}

pub struct ConfigLoaderFile {
    path: PathBuf,
}

impl ConfigLoader for ConfigLoaderFile {
    fn load(&self) -> Result<ConvergeConfig, ConfigError> {
        let file = std::fs::File::open(&self.path)?;
        Ok(serde_yaml::from_reader(file)?)
    }
}

impl ConfigLoaderFile {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
