//! Process execution for a single test case
//!
//! Spawns the program, feeds the input, collects output and memory figures,
//! and turns them into a [`TestReport`].

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::MissedTickBehavior;
use tracing::{debug, instrument};

use crate::problem::TestCase;
use crate::runner::group::ProcessGroup;
use crate::runner::probe::MemoryProbe;
use crate::runner::{Program, RunError};
use crate::types::{TestOutcome, TestReport};

/// Classify a finished test case
///
/// Order matters: a mapped compile-error exit code wins, then the output
/// comparison (exact bytes), then the memory budget, then any other abnormal
/// exit.
pub fn classify(
    program: &Program,
    exit_code: Option<i32>,
    stdout: &[u8],
    expected: &[u8],
    memory_kb: u64,
    max_memory_kb: u64,
) -> TestOutcome {
    if program.is_compile_error(exit_code) {
        TestOutcome::CompileError
    } else if stdout != expected {
        TestOutcome::WrongAnswer
    } else if memory_kb > max_memory_kb {
        TestOutcome::MemoryExceeded
    } else if exit_code != Some(0) {
        TestOutcome::RuntimeError
    } else {
        TestOutcome::Pass
    }
}

/// Run a program against one test case
///
/// The program leads its own process group. The whole group is killed as soon
/// as the leader exits, or when this future is dropped before that.
#[instrument(skip(program, test_case), fields(test_id = %test_case.id))]
pub(crate) async fn run_test_case(
    program: &Program,
    test_case: &TestCase,
    max_memory_kb: u64,
    sample_interval: Duration,
) -> Result<TestReport, RunError> {
    let (executable, args) = program
        .command
        .split_first()
        .ok_or(RunError::EmptyCommand)?;

    let mut command = Command::new(executable);
    command
        .args(args)
        .envs(&program.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);
    if let Some(ref dir) = program.working_dir {
        command.current_dir(dir);
    }

    let started = Instant::now();
    let mut child = command.spawn().map_err(|source| RunError::SpawnFailed {
        program: executable.clone(),
        source,
    })?;

    let mut group = ProcessGroup::new(child.id());
    let mut probe = MemoryProbe::attach(group.id()).await;
    debug!(pgid = ?group.id(), baseline_kb = probe.baseline_kb(), "spawned test program");

    let mut stdin = child.stdin.take().ok_or(RunError::StdinUnavailable)?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or(RunError::OutputUnavailable("stdout"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or(RunError::OutputUnavailable("stderr"))?;

    let input = test_case.input.as_bytes();
    let feed = async move {
        let written = stdin.write_all(input).await;
        // Closing stdin signals EOF to the program
        drop(stdin);
        match written {
            // The program exited without reading all of its input
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    };

    let collect_stdout = async {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).await.map(|_| buf)
    };
    let collect_stderr = async {
        let mut buf = Vec::new();
        stderr.read_to_end(&mut buf).await.map(|_| buf)
    };

    let wait = async {
        let mut ticker = tokio::time::interval(sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                _ = ticker.tick() => probe.sample().await,
            }
        };
        // Leftover background processes would otherwise hold the output
        // pipes open and keep running after the verdict
        group.kill();
        status
    };

    let (fed, out, err, status) = tokio::join!(feed, collect_stdout, collect_stderr, wait);
    let status = status?;
    fed?;
    let stdout = out?;
    let stderr = err?;
    let elapsed = started.elapsed();

    let memory_kb = probe.delta_kb();
    let exit_code = status.code();
    let outcome = classify(
        program,
        exit_code,
        &stdout,
        test_case.expected_output.as_bytes(),
        memory_kb,
        max_memory_kb,
    );

    debug!(
        ?outcome,
        ?exit_code,
        memory_kb,
        elapsed_ms = elapsed.as_millis() as u64,
        "test case finished"
    );

    Ok(TestReport {
        test_id: test_case.id.clone(),
        outcome,
        stdout,
        stderr,
        memory_kb,
        exit_code,
        elapsed,
    })
}
