//! Verdict aggregation
//!
//! Fans a program out over every test case of a problem and reduces the
//! reports to a single [`Verdict`] within the problem's runtime budget.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use crate::problem::Problem;
use crate::runner::{Program, RunError, TestRunner};
use crate::types::{TestOutcome, TestReport, Verdict};

type Joined = Result<Result<TestReport, RunError>, JoinError>;

/// Whether a failure that arrived later replaces the current one
///
/// The higher [`priority`](TestOutcome::priority) wins; on equal priority the
/// later failure wins.
pub fn outranks(later: TestOutcome, current: TestOutcome) -> bool {
    later.priority() >= current.priority()
}

/// Verdict when the runtime budget ran out
pub fn on_deadline(passed: usize, total: usize) -> Verdict {
    if passed == total {
        Verdict::accepted()
    } else {
        Verdict::time_limit_exceeded()
    }
}

/// Runs every test case of a problem and decides the verdict
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    runner: TestRunner,
    max_parallel_tests: Option<usize>,
}

impl Aggregator {
    pub fn new(runner: TestRunner) -> Self {
        Self {
            runner,
            max_parallel_tests: None,
        }
    }

    /// Bound how many test cases run at once (`None` starts them all)
    pub fn max_parallel_tests(mut self, limit: Option<usize>) -> Self {
        self.max_parallel_tests = limit;
        self
    }

    /// Judge a program against a problem
    ///
    /// Returns as soon as the outcome is decided. Test cases still running at
    /// that point are aborted and their processes killed before this returns.
    #[instrument(skip_all, fields(problem_id = %problem.id, tests = problem.test_cases.len()))]
    pub async fn judge(&self, program: &Program, problem: &Problem) -> Result<Verdict, RunError> {
        let total = problem.test_cases.len();
        if total == 0 {
            info!("problem has no test cases");
            return Ok(Verdict::accepted());
        }

        let program = Arc::new(program.clone());
        let limiter = self.max_parallel_tests.map(|n| Arc::new(Semaphore::new(n)));
        let max_memory_kb = problem.max_memory_kb;

        let mut set = JoinSet::new();
        for test_case in problem.test_cases.iter().cloned() {
            let runner = self.runner.clone();
            let program = Arc::clone(&program);
            let limiter = limiter.clone();
            set.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => Some(limiter.acquire_owned().await.map_err(|_| {
                        RunError::TaskFailed("test case limiter closed".to_owned())
                    })?),
                    None => None,
                };
                runner.run(&program, &test_case, max_memory_kb).await
            });
        }

        let deadline = tokio::time::sleep(problem.max_runtime());
        tokio::pin!(deadline);

        let mut passed = 0;
        let verdict = loop {
            tokio::select! {
                biased;

                joined = set.join_next() => {
                    let Some(joined) = joined else {
                        break Ok(Verdict::accepted());
                    };
                    let report = match settle(joined) {
                        Ok(report) => report,
                        Err(e) => break Err(e),
                    };
                    debug!(test_id = %report.test_id, outcome = ?report.outcome, memory_kb = report.memory_kb, "test case reported");

                    let Some(failure) = Verdict::from_failure(&report) else {
                        passed += 1;
                        if passed == total {
                            break Ok(Verdict::accepted());
                        }
                        continue;
                    };
                    break strongest_ready(&mut set, report.outcome, failure);
                }

                () = &mut deadline => {
                    debug!(passed, total, "runtime budget exhausted");
                    break Ok(on_deadline(passed, total));
                }
            }
        };

        set.shutdown().await;

        match &verdict {
            Ok(verdict) => info!(status = %verdict.status, passed, total, "verdict reached"),
            Err(e) => warn!(error = %e, "judge run aborted"),
        }
        verdict
    }
}

/// Unwrap a finished task, turning a panic or abort into a run error
fn settle(joined: Joined) -> Result<TestReport, RunError> {
    joined.map_err(|e| RunError::TaskFailed(e.to_string()))?
}

/// Settle the verdict among the first failure and any test cases that
/// already finished alongside it
fn strongest_ready(
    set: &mut JoinSet<Result<TestReport, RunError>>,
    mut outcome: TestOutcome,
    mut verdict: Verdict,
) -> Result<Verdict, RunError> {
    while let Some(joined) = set.try_join_next() {
        let report = settle(joined)?;
        if let Some(candidate) = Verdict::from_failure(&report)
            && outranks(report.outcome, outcome)
        {
            outcome = report.outcome;
            verdict = candidate;
        }
    }
    Ok(verdict)
}
