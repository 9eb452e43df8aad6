use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::language::{FileExtension, Language, RunConfig};

pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../gavel.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("language '{0}' not found in configuration")]
    LanguageNotFound(String),

    #[error("no language given and no default_language configured")]
    NoDefaultLanguage,

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Gavel
///
/// Constructed once by the process that wires the engine together and passed
/// to the components that need it.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory where submitted sources are saved.
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Language used when a submission doesn't name one.
    #[serde(default)]
    pub default_language: Option<String>,

    /// Upper bound on judge runs in flight at once. Unbounded if not set.
    #[serde(default)]
    pub max_concurrent_judges: Option<usize>,

    /// Upper bound on test cases running at once within one judge run.
    /// All test cases start together if not set.
    #[serde(default)]
    pub max_parallel_tests: Option<usize>,

    /// Interval between resident memory samples of a running test case.
    #[serde(default = "default_sample_interval_ms")]
    pub memory_sample_interval_ms: u64,

    /// Language configurations keyed by language ID
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

impl Config {
    /// Create a new config with embedded default languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no languages
    pub fn empty() -> Self {
        Self {
            source_dir: default_source_dir(),
            default_language: None,
            max_concurrent_judges: None,
            max_parallel_tests: None,
            memory_sample_interval_ms: default_sample_interval_ms(),
            languages: HashMap::new(),
        }
    }

    /// Get a language by ID
    pub fn get_language(&self, id: &str) -> Result<&Language, ConfigError> {
        self.languages
            .get(id)
            .ok_or_else(|| ConfigError::LanguageNotFound(id.to_string()))
    }

    /// Resolve an explicit language ID, falling back to `default_language`
    pub fn resolve_language(&self, id: Option<&str>) -> Result<&Language, ConfigError> {
        match id.or(self.default_language.as_deref()) {
            Some(id) => self.get_language(id),
            None => Err(ConfigError::NoDefaultLanguage),
        }
    }

    /// Memory sampling interval as a duration
    pub fn memory_sample_interval(&self) -> Duration {
        Duration::from_millis(self.memory_sample_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("code")
}

fn default_sample_interval_ms() -> u64 {
    5
}
