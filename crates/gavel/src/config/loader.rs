//! Configuration file loading for Gavel
//!
//! Handles loading and parsing configuration files using the config crate.

use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};

use crate::config::{Config, ConfigError};

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        for (id, lang) in &self.languages {
            if lang.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty name"
                )));
            }
            if lang.extension.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty extension"
                )));
            }
            if lang.run.command.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty run command"
                )));
            }
            if lang.run.compile_error_exit_codes.contains(&0) {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' maps exit code 0 to a compile error"
                )));
            }
        }

        if let Some(ref id) = self.default_language
            && !self.languages.contains_key(id)
        {
            return Err(ConfigError::Invalid(format!(
                "default_language '{id}' is not configured"
            )));
        }

        if self.max_concurrent_judges == Some(0) {
            return Err(ConfigError::Invalid(
                "max_concurrent_judges must be at least 1".to_owned(),
            ));
        }
        if self.max_parallel_tests == Some(0) {
            return Err(ConfigError::Invalid(
                "max_parallel_tests must be at least 1".to_owned(),
            ));
        }
        if self.memory_sample_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "memory_sample_interval_ms must be positive".to_owned(),
            ));
        }

        Ok(())
    }
}
