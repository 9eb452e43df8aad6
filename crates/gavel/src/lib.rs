//! A judge engine for online programming contests.
//!
//! Gavel runs a submitted program against every test case of a problem,
//! decides a single verdict within the problem's runtime budget and commits
//! the judged submission together with the per-user and per-problem counters.
//!
//! # Features
//!
//! - **Concurrent test cases** - Every test case runs as its own task; the first failure decides.
//! - **Deterministic verdicts** - Failures finishing together resolve by a fixed priority.
//! - **Memory accounting** - Resident memory of each child is sampled from `/proc`.
//! - **TOML configuration** - Per-language run commands and compile-error exit codes.
//! - **Pluggable storage** - Problems and submissions live behind the [`Store`] trait.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Language};
pub use problem::{Problem, ProblemError, TestCase};
pub use runner::{Program, RunError, TestRunner};
pub use session::{JudgeError, JudgeRequest, JudgeSession};
pub use store::{MemoryStore, SourceStore, Store, StoreError};
pub use types::{Counters, Status, Submission, TestOutcome, TestReport, Verdict};
pub use verdict::Aggregator;

pub mod config;
pub mod problem;
pub mod runner;
pub mod session;
pub mod store;
pub mod types;
pub mod verdict;
