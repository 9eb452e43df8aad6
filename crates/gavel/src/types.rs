use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Final classification of a submission
///
/// The numeric codes are the ones stored alongside submission records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not judged yet
    Pending,

    /// Every test case produced the expected output within the limits
    Accepted,

    /// Output of at least one test case did not match
    WrongAnswer,

    /// The run did not finish within the problem's runtime budget
    TimeLimitExceeded,

    /// Memory delta of at least one test case was above the problem's budget
    MemoryLimitExceeded,

    /// The program exited with one of its language's compile-error codes
    CompileError,

    /// The program exited abnormally with an unmapped code or signal
    RuntimeError,
}

impl Status {
    /// Numeric code of this status
    pub fn code(self) -> i8 {
        match self {
            Status::Pending => -1,
            Status::Accepted => 1,
            Status::WrongAnswer => 2,
            Status::TimeLimitExceeded => 3,
            Status::MemoryLimitExceeded => 4,
            Status::CompileError => 5,
            Status::RuntimeError => 6,
        }
    }

    /// Parse a numeric status code
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(Status::Pending),
            1 => Some(Status::Accepted),
            2 => Some(Status::WrongAnswer),
            3 => Some(Status::TimeLimitExceeded),
            4 => Some(Status::MemoryLimitExceeded),
            5 => Some(Status::CompileError),
            6 => Some(Status::RuntimeError),
            _ => None,
        }
    }

    /// Check if the status is terminal (anything but `Pending`)
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Status::Pending)
    }

    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, Status::Accepted)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Pending => "Pending",
            Status::Accepted => "Accepted",
            Status::WrongAnswer => "Wrong Answer",
            Status::TimeLimitExceeded => "Time Limit Exceeded",
            Status::MemoryLimitExceeded => "Memory Limit Exceeded",
            Status::CompileError => "Compile Error",
            Status::RuntimeError => "Runtime Error",
        };
        f.write_str(name)
    }
}

/// Result of running one test case
///
/// Transient: only the aggregated [`Verdict`] is ever stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestOutcome {
    Pass,
    WrongAnswer,
    MemoryExceeded,
    CompileError,
    RuntimeError,
}

impl TestOutcome {
    #[must_use]
    pub fn is_pass(self) -> bool {
        matches!(self, TestOutcome::Pass)
    }

    /// Rank used to pick a winner among failures that completed together.
    ///
    /// Higher wins: CompileError > MemoryExceeded > RuntimeError > WrongAnswer.
    pub fn priority(self) -> u8 {
        match self {
            TestOutcome::Pass => 0,
            TestOutcome::WrongAnswer => 1,
            TestOutcome::RuntimeError => 2,
            TestOutcome::MemoryExceeded => 3,
            TestOutcome::CompileError => 4,
        }
    }

    /// Submission status this outcome maps to
    pub fn status(self) -> Status {
        match self {
            TestOutcome::Pass => Status::Accepted,
            TestOutcome::WrongAnswer => Status::WrongAnswer,
            TestOutcome::MemoryExceeded => Status::MemoryLimitExceeded,
            TestOutcome::CompileError => Status::CompileError,
            TestOutcome::RuntimeError => Status::RuntimeError,
        }
    }
}

/// Everything a test runner observed for one test case
#[derive(Debug, Clone)]
pub struct TestReport {
    /// Identity of the test case this report belongs to
    pub test_id: String,

    /// Classified outcome
    pub outcome: TestOutcome,

    /// Captured standard output
    pub stdout: Vec<u8>,

    /// Captured standard error
    pub stderr: Vec<u8>,

    /// Memory delta in kilobytes (peak resident set minus the baseline at spawn)
    pub memory_kb: u64,

    /// Exit code if the program exited normally
    pub exit_code: Option<i32>,

    /// Wall time from spawn to exit
    pub elapsed: Duration,
}

impl TestReport {
    /// Standard error decoded lossily, used as the compile-error diagnostic
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Final status and the message reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: Status,
    pub message: String,
}

impl Verdict {
    pub const ACCEPTED_MESSAGE: &str = "all test cases passed";
    pub const TIME_LIMIT_MESSAGE: &str = "execution exceeded time budget";

    pub fn accepted() -> Self {
        Self {
            status: Status::Accepted,
            message: Self::ACCEPTED_MESSAGE.to_owned(),
        }
    }

    pub fn time_limit_exceeded() -> Self {
        Self {
            status: Status::TimeLimitExceeded,
            message: Self::TIME_LIMIT_MESSAGE.to_owned(),
        }
    }

    /// Build the verdict for a failing test report
    ///
    /// Returns `None` for passing reports.
    pub fn from_failure(report: &TestReport) -> Option<Self> {
        let message = match report.outcome {
            TestOutcome::Pass => return None,
            TestOutcome::CompileError => report.stderr_lossy(),
            TestOutcome::WrongAnswer => format!("wrong answer on test case {}", report.test_id),
            TestOutcome::MemoryExceeded => {
                format!("memory limit exceeded on test case {}", report.test_id)
            }
            TestOutcome::RuntimeError => {
                let exit = match report.exit_code {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".to_owned(),
                };
                format!("runtime error on test case {}: {exit}", report.test_id)
            }
        };

        Some(Self {
            status: report.outcome.status(),
            message,
        })
    }
}

/// A judged submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,

    pub problem_id: String,

    /// Identity of the submitting user
    pub user_id: String,

    /// Where the submitted source was saved
    pub source_path: PathBuf,

    pub status: Status,

    /// Informational message (diagnostic for compile errors)
    pub message: String,
}

impl Submission {
    /// Create a pending submission with a fresh identity
    pub fn new(
        problem_id: impl Into<String>,
        user_id: impl Into<String>,
        source_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            problem_id: problem_id.into(),
            user_id: user_id.into(),
            source_path: source_path.into(),
            status: Status::Pending,
            message: String::new(),
        }
    }

    /// Record the final verdict
    pub fn with_verdict(mut self, verdict: Verdict) -> Self {
        self.status = verdict.status;
        self.message = verdict.message;
        self
    }

    pub fn verdict(&self) -> Verdict {
        Verdict {
            status: self.status,
            message: self.message.clone(),
        }
    }
}

/// Aggregate submit/pass counters kept per user and per problem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub submit_count: u64,
    pub pass_count: u64,
}

impl Counters {
    /// Count one submission with the given status
    pub fn record(&mut self, status: Status) {
        self.submit_count += 1;
        if status.is_accepted() {
            self.pass_count += 1;
        }
    }
}
