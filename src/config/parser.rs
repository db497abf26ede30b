use super::StackSettings;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: [&str; 2] = ["stackup.yaml", "stackup.yml"];

#[derive(Debug)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Find config file starting from current directory
    pub fn find_config_file(&self) -> Result<Option<PathBuf>> {
        let current_dir = std::env::current_dir()?;
        Ok(Self::find_config_in_dir(&current_dir))
    }

    pub fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        // Try parent directory
        dir.parent().and_then(Self::find_config_in_dir)
    }

    /// Load config from file path
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<StackSettings> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let settings = self.parse_config(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load the config at `path`, or the discovered one, or defaults when none exists.
    pub fn load_or_default(&self, path: Option<&Path>) -> Result<(StackSettings, Option<PathBuf>)> {
        let path = match path {
            Some(explicit) => Some(explicit.to_path_buf()),
            None => self.find_config_file()?,
        };

        match path {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Ok((self.load_config(&path)?, Some(path)))
            }
            None => {
                tracing::debug!("No stackup.yaml found, using built-in defaults");
                Ok((StackSettings::default(), None))
            }
        }
    }

    /// Parse config from YAML string
    pub fn parse_config(&self, content: &str) -> Result<StackSettings> {
        if content.trim().is_empty() {
            return Ok(StackSettings::default());
        }

        let settings: StackSettings = serde_yaml::from_str(content)
            .map_err(|e| Error::Parse(format!("Failed to parse YAML config: {}", e)))?;

        Ok(settings)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
