//! Integration tests for gavel
//!
//! These tests run real programs through `sh`, so they need a POSIX shell on
//! the path. The memory limit test reads `/proc` and only runs on Linux.

#![cfg(unix)]

use std::path::Path;

use gavel::config::Config;
use gavel::runner::Program;

mod aggregator;
mod config_loading;
mod session;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Path of a fixture file
pub(crate) fn fixture_path(kind: &str, name: &str) -> String {
    format!("{FIXTURES_PATH}/{kind}/{name}")
}

/// Helper to get fixture source content
pub(crate) fn fixture_source(name: &str) -> Vec<u8> {
    let path = fixture_path("sources", name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
}

/// Program running a fixture script with the shell language's exit code mapping
pub(crate) fn fixture_program(name: &str) -> Program {
    Program::new(["sh".to_owned(), fixture_path("sources", name)]).compile_error_exit_codes([2])
}

/// Default config judging `sh` submissions into the given directory
pub(crate) fn test_config(source_dir: &Path) -> Config {
    let mut config = Config::default();
    config.source_dir = source_dir.to_path_buf();
    config.default_language = Some("sh".to_owned());
    config
}
