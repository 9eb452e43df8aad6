use std::time::{Duration, Instant};

use gavel::problem::Problem;
use gavel::session::{JudgeError, JudgeSession};
use gavel::store::{MemoryStore, StoreError};
use gavel::types::{Counters, Status};

use super::{fixture_path, fixture_source, test_config};

fn store_with(problem: Problem) -> MemoryStore {
    let store = MemoryStore::new();
    store.insert_problem(problem).unwrap();
    store.insert_user("alice").unwrap();
    store
}

fn sum_session(source_dir: &std::path::Path) -> JudgeSession<MemoryStore> {
    let problem = Problem::from_file(fixture_path("problems", "sum.toml")).unwrap();
    JudgeSession::new(test_config(source_dir), store_with(problem))
}

#[tokio::test]
async fn test_accepted_submission_updates_counters() {
    let dir = tempfile::tempdir().unwrap();
    let session = sum_session(dir.path());

    let submission = session
        .judge("sum", "alice", &fixture_source("sum.sh"))
        .await
        .unwrap();

    assert_eq!(submission.status, Status::Accepted);
    assert_eq!(submission.message, "all test cases passed");
    assert_eq!(
        std::fs::read(&submission.source_path).unwrap(),
        fixture_source("sum.sh")
    );

    let store = session.store();
    let expected = Counters {
        submit_count: 1,
        pass_count: 1,
    };
    assert_eq!(store.user_counters("alice").unwrap(), Some(expected));
    assert_eq!(store.problem_counters("sum").unwrap(), Some(expected));
    assert_eq!(store.submissions().unwrap()[0].id, submission.id);
}

#[tokio::test]
async fn test_wrong_answer_counts_submission_only() {
    let dir = tempfile::tempdir().unwrap();
    let session = sum_session(dir.path());

    let submission = session
        .judge("sum", "alice", &fixture_source("zero.sh"))
        .await
        .unwrap();
    assert_eq!(submission.status, Status::WrongAnswer);

    let counters = session.store().user_counters("alice").unwrap().unwrap();
    assert_eq!(counters.submit_count, 1);
    assert_eq!(counters.pass_count, 0);
}

#[tokio::test]
async fn test_time_limit_returns_within_budget() {
    let dir = tempfile::tempdir().unwrap();
    let problem = Problem::parse_toml(
        r#"
id = "slow"
max_memory_kb = 65536
max_runtime_ms = 200

[[test_cases]]
expected_output = "5"
"#,
    )
    .unwrap();
    let session = JudgeSession::new(test_config(dir.path()), store_with(problem));

    let started = Instant::now();
    let submission = session
        .judge("slow", "alice", &fixture_source("sleep.sh"))
        .await
        .unwrap();

    assert_eq!(submission.status, Status::TimeLimitExceeded);
    assert!(started.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_compile_error_message_is_stored() {
    let dir = tempfile::tempdir().unwrap();
    let session = sum_session(dir.path());

    let submission = session
        .judge("sum", "alice", &fixture_source("syntax_error.sh"))
        .await
        .unwrap();

    assert_eq!(submission.status, Status::CompileError);
    let stored = &session.store().submissions().unwrap()[0];
    assert_eq!(stored.message, submission.message);
    assert!(!stored.message.is_empty());
}

#[tokio::test]
async fn test_unknown_problem_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let session = sum_session(dir.path());

    let result = session
        .judge("product", "alice", &fixture_source("sum.sh"))
        .await;
    assert!(matches!(result, Err(JudgeError::ProblemNotFound(_))));
}

#[tokio::test]
async fn test_unknown_user_loses_verdict_without_partial_commit() {
    let dir = tempfile::tempdir().unwrap();
    let session = sum_session(dir.path());

    let result = session
        .judge("sum", "bob", &fixture_source("sum.sh"))
        .await;
    assert!(matches!(
        result,
        Err(JudgeError::Persistence(StoreError::UserNotFound(_)))
    ));

    let problem = session.store().problem_counters("sum").unwrap().unwrap();
    assert_eq!(problem.submit_count, 0);
    assert!(session.store().submissions().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_judges_with_admission_limit() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.max_concurrent_judges = Some(1);
    let problem = Problem::from_file(fixture_path("problems", "sum.toml")).unwrap();
    let session = JudgeSession::new(config, store_with(problem));

    let sum = fixture_source("sum.sh");
    let zero = fixture_source("zero.sh");
    let (first, second) = tokio::join!(
        session.judge("sum", "alice", &sum),
        session.judge("sum", "alice", &zero),
    );

    assert_eq!(first.unwrap().status, Status::Accepted);
    assert_eq!(second.unwrap().status, Status::WrongAnswer);
    assert_ne!(
        session.store().submissions().unwrap()[0].source_path.parent(),
        session.store().submissions().unwrap()[1].source_path.parent()
    );

    let counters = session.store().user_counters("alice").unwrap().unwrap();
    assert_eq!(counters.submit_count, 2);
    assert_eq!(counters.pass_count, 1);
}
