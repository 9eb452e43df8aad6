//! Problem definitions for judging
//!
//! A problem bundles the runtime and memory budgets with its ordered test cases.
//! Problems are read-only inputs to a judge run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as ConfigBuilder, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("problem file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to parse problem: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid problem: {0}")]
    Invalid(String),
}

/// One (input, expected output) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Test case identity (defaults to its 1-based position when loaded from a file)
    #[serde(default)]
    pub id: String,

    /// Text written to the program's standard input
    #[serde(default)]
    pub input: String,

    /// Exact bytes the program must print on standard output
    pub expected_output: String,
}

impl TestCase {
    pub fn new(
        id: impl Into<String>,
        input: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Problem constraints and test cases
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,

    /// Maximum memory delta per test case in kilobytes
    pub max_memory_kb: u64,

    /// Wall clock budget for the whole judge run in milliseconds
    pub max_runtime_ms: u64,

    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl Problem {
    pub fn new(id: impl Into<String>, max_memory_kb: u64, max_runtime_ms: u64) -> Self {
        Self {
            id: id.into(),
            max_memory_kb,
            max_runtime_ms,
            test_cases: Vec::new(),
        }
    }

    /// Append a test case
    pub fn with_test_case(mut self, test_case: TestCase) -> Self {
        self.test_cases.push(test_case);
        self
    }

    /// Runtime budget as a duration
    pub fn max_runtime(&self) -> Duration {
        Duration::from_millis(self.max_runtime_ms)
    }

    /// Load a problem from a TOML or JSON file (format chosen by extension)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProblemError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProblemError::NotFound(path.to_path_buf()));
        }

        let problem = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let problem: Problem = problem.try_deserialize()?;
        problem.normalized()
    }

    /// Parse a problem from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ProblemError> {
        let problem = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let problem: Problem = problem.try_deserialize()?;
        problem.normalized()
    }

    /// Fill in missing test case ids and validate
    fn normalized(mut self) -> Result<Self, ProblemError> {
        for (idx, test_case) in self.test_cases.iter_mut().enumerate() {
            if test_case.id.is_empty() {
                test_case.id = (idx + 1).to_string();
            }
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ProblemError> {
        if self.id.is_empty() {
            return Err(ProblemError::Invalid("problem has empty id".to_owned()));
        }
        if self.max_runtime_ms == 0 {
            return Err(ProblemError::Invalid(format!(
                "problem '{}' has zero max_runtime_ms",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        for test_case in &self.test_cases {
            if !seen.insert(test_case.id.as_str()) {
                return Err(ProblemError::Invalid(format!(
                    "problem '{}' has duplicate test case id '{}'",
                    self.id, test_case.id
                )));
            }
        }

        Ok(())
    }
}
