//! Test runner for Gavel
//!
//! Runs a submitted program against a single test case and classifies what
//! happened.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use crate::runner::execute::classify;
pub use crate::runner::probe::{MemoryProbe, ProcessMemory};

mod execute;
mod group;
mod probe;

use crate::problem::TestCase;
use crate::types::TestReport;

/// Errors that prevent a test case from producing an outcome at all
///
/// These are engine failures, never judged results.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("program has an empty command")]
    EmptyCommand,

    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("child process has no stdin handle")]
    StdinUnavailable,

    #[error("child process has no {0} handle")]
    OutputUnavailable(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("runner task failed: {0}")]
    TaskFailed(String),
}

/// How to launch a submitted program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Program and arguments
    pub command: Vec<String>,

    /// Extra environment variables
    pub env: HashMap<String, String>,

    /// Working directory of the child (inherited if not set)
    pub working_dir: Option<PathBuf>,

    /// Exit codes meaning the toolchain rejected the source
    pub compile_error_exit_codes: Vec<i32>,
}

impl Program {
    /// Create a program from a command line with no compile-error mapping
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            env: HashMap::new(),
            working_dir: None,
            compile_error_exit_codes: Vec::new(),
        }
    }

    /// Set the working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the exit codes that classify as compile errors
    pub fn compile_error_exit_codes(mut self, codes: impl Into<Vec<i32>>) -> Self {
        self.compile_error_exit_codes = codes.into();
        self
    }

    /// Check whether an exit code means the source failed to build
    pub fn is_compile_error(&self, exit_code: Option<i32>) -> bool {
        exit_code.is_some_and(|code| self.compile_error_exit_codes.contains(&code))
    }
}

/// Runs one program against one test case
#[derive(Debug, Clone)]
pub struct TestRunner {
    sample_interval: Duration,
}

impl TestRunner {
    /// Create a runner that samples child memory at the given interval
    pub fn new(sample_interval: Duration) -> Self {
        Self { sample_interval }
    }

    pub fn sample_interval(&self) -> Duration {
        self.sample_interval
    }

    /// Run the program on the test case's input and classify the result
    pub async fn run(
        &self,
        program: &Program,
        test_case: &TestCase,
        max_memory_kb: u64,
    ) -> Result<TestReport, RunError> {
        execute::run_test_case(program, test_case, max_memory_kb, self.sample_interval).await
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(5))
    }
}
