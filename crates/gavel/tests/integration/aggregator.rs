use std::path::PathBuf;
use std::time::{Duration, Instant};

use gavel::problem::{Problem, TestCase};
use gavel::runner::{Program, RunError, TestRunner};
use gavel::types::Status;
use gavel::verdict::Aggregator;

use super::fixture_program;

/// Shell program with `{marker}` replaced by a file path in a fresh directory
fn marker_program(script: &str) -> (tempfile::TempDir, PathBuf, Program) {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("late");
    let script = script.replace("{marker}", &marker.display().to_string());
    let program = Program::new(["sh".to_owned(), "-c".to_owned(), script]);
    (dir, marker, program)
}

fn sum_problem(max_runtime_ms: u64) -> Problem {
    Problem::new("sum", 65536, max_runtime_ms)
        .with_test_case(TestCase::new("1", "2 3", "5"))
        .with_test_case(TestCase::new("2", "-4 4", "0"))
        .with_test_case(TestCase::new("3", "1000000 234567", "1234567"))
}

#[tokio::test]
async fn test_all_pass_is_accepted_before_deadline() {
    let started = Instant::now();
    let verdict = Aggregator::default()
        .judge(&fixture_program("sum.sh"), &sum_problem(5000))
        .await
        .unwrap();

    assert_eq!(verdict.status, Status::Accepted);
    assert_eq!(verdict.message, "all test cases passed");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_bounded_parallelism_still_accepts() {
    let verdict = Aggregator::new(TestRunner::default())
        .max_parallel_tests(Some(1))
        .judge(&fixture_program("sum.sh"), &sum_problem(5000))
        .await
        .unwrap();

    assert_eq!(verdict.status, Status::Accepted);
}

#[tokio::test]
async fn test_wrong_answer_names_test_case() {
    let problem = Problem::new("five", 65536, 2000).with_test_case(TestCase::new("7", "", "5"));
    let verdict = Aggregator::default()
        .judge(&fixture_program("zero.sh"), &problem)
        .await
        .unwrap();

    assert_eq!(verdict.status, Status::WrongAnswer);
    assert_eq!(verdict.message, "wrong answer on test case 7");
}

#[tokio::test]
async fn test_one_wrong_test_case_fails_the_run() {
    let problem = sum_problem(5000).with_test_case(TestCase::new("bad", "1 1", "3"));
    let verdict = Aggregator::default()
        .judge(&fixture_program("sum.sh"), &problem)
        .await
        .unwrap();

    assert_eq!(verdict.status, Status::WrongAnswer);
    assert_eq!(verdict.message, "wrong answer on test case bad");
}

#[tokio::test]
async fn test_slow_program_is_time_limit_exceeded() {
    let problem = Problem::new("slow", 65536, 200).with_test_case(TestCase::new("1", "", "5"));
    let started = Instant::now();
    let verdict = Aggregator::default()
        .judge(&fixture_program("sleep.sh"), &problem)
        .await
        .unwrap();

    assert_eq!(verdict.status, Status::TimeLimitExceeded);
    assert_eq!(verdict.message, "execution exceeded time budget");
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_compile_error_carries_diagnostic() {
    let problem = Problem::new("five", 65536, 2000).with_test_case(TestCase::new("1", "", "5"));
    let verdict = Aggregator::default()
        .judge(&fixture_program("syntax_error.sh"), &problem)
        .await
        .unwrap();

    assert_eq!(verdict.status, Status::CompileError);
    assert!(!verdict.message.is_empty());
}

#[tokio::test]
async fn test_runtime_error_reports_exit_code() {
    let problem = Problem::new("five", 65536, 2000).with_test_case(TestCase::new("1", "", "5"));
    let verdict = Aggregator::default()
        .judge(&fixture_program("crash.sh"), &problem)
        .await
        .unwrap();

    assert_eq!(verdict.status, Status::RuntimeError);
    assert_eq!(verdict.message, "runtime error on test case 1: exit code 3");
}

#[tokio::test]
#[cfg(target_os = "linux")]
async fn test_memory_hog_is_memory_limit_exceeded() {
    let problem =
        Problem::new("five", 16 * 1024, 5000).with_test_case(TestCase::new("1", "", "5"));
    let verdict = Aggregator::default()
        .judge(&fixture_program("memory_hog.sh"), &problem)
        .await
        .unwrap();

    assert_eq!(verdict.status, Status::MemoryLimitExceeded);
    assert_eq!(verdict.message, "memory limit exceeded on test case 1");
}

#[tokio::test]
async fn test_launch_failure_aborts_the_run() {
    let program = Program::new(["gavel-no-such-interpreter"]);
    let result = Aggregator::default()
        .judge(&program, &sum_problem(2000))
        .await;

    assert!(matches!(result, Err(RunError::SpawnFailed { .. })));
}

#[tokio::test]
async fn test_timed_out_program_cannot_act_after_verdict() {
    let (_dir, marker, program) = marker_program("sleep 0.5; touch '{marker}'; printf 5");
    let problem = Problem::new("slow", 65536, 100).with_test_case(TestCase::new("1", "", "5"));

    let verdict = Aggregator::default().judge(&program, &problem).await.unwrap();
    assert_eq!(verdict.status, Status::TimeLimitExceeded);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_forked_grandchild_cannot_act_after_verdict() {
    let (_dir, marker, program) = marker_program("sh -c 'sleep 0.5; touch {marker}'; true");
    let problem = Problem::new("slow", 65536, 100).with_test_case(TestCase::new("1", "", "5"));

    let verdict = Aggregator::default().judge(&program, &problem).await.unwrap();
    assert_eq!(verdict.status, Status::TimeLimitExceeded);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_losing_test_cases_are_cancelled_on_failure() {
    let (_dir, marker, program) = marker_program(
        "read t; if [ \"$t\" = slow ]; then sh -c 'sleep 0.5; touch {marker}'; fi; printf 0",
    );
    let problem = Problem::new("mixed", 65536, 5000)
        .with_test_case(TestCase::new("fast", "fast", "5"))
        .with_test_case(TestCase::new("slow", "slow", "0"));

    let verdict = Aggregator::default().judge(&program, &problem).await.unwrap();
    assert_eq!(verdict.status, Status::WrongAnswer);
    assert_eq!(verdict.message, "wrong answer on test case fast");

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_rejudging_gives_the_same_verdict() {
    let aggregator = Aggregator::default();
    let problem = sum_problem(5000);

    for fixture in ["sum.sh", "zero.sh"] {
        let program = fixture_program(fixture);
        let first = aggregator.judge(&program, &problem).await.unwrap();
        let second = aggregator.judge(&program, &problem).await.unwrap();
        // Failing test cases may report in any order; only the status is stable
        assert_eq!(first.status, second.status, "{fixture} judged differently");
    }
}
