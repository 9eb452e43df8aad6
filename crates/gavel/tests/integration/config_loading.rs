use gavel::config::{Config, ConfigError};
use gavel::problem::{Problem, ProblemError};

use super::fixture_path;

#[test]
fn test_load_valid_config() {
    let config = Config::from_file(fixture_path("configs", "valid_full.toml"))
        .expect("Failed to load config");

    assert_eq!(config.default_language.as_deref(), Some("sh"));
    assert_eq!(config.max_concurrent_judges, Some(4));
    assert_eq!(config.max_parallel_tests, Some(2));
    assert_eq!(config.languages["sh"].run.compile_error_exit_codes, vec![2]);
    assert!(
        config.languages["python3"]
            .run
            .compile_error_exit_codes
            .is_empty()
    );
}

#[test]
fn test_load_invalid_default_language() {
    let result = Config::from_file(fixture_path("configs", "invalid_default_language.toml"));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_load_invalid_extension() {
    let result = Config::from_file(fixture_path("configs", "invalid_extension.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_problem_toml() {
    let problem =
        Problem::from_file(fixture_path("problems", "sum.toml")).expect("Failed to load problem");

    assert_eq!(problem.id, "sum");
    let ids: Vec<_> = problem.test_cases.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["1", "2", "large"]);
}

#[test]
fn test_load_problem_json() {
    let problem =
        Problem::from_file(fixture_path("problems", "sum.json")).expect("Failed to load problem");

    assert_eq!(problem.id, "sum-json");
    assert_eq!(problem.test_cases[0].id, "small");
}

#[test]
fn test_load_missing_problem() {
    let result = Problem::from_file(fixture_path("problems", "missing.toml"));
    assert!(matches!(result, Err(ProblemError::NotFound(_))));
}
