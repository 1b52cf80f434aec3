//! End-to-end tests running real shell commands through the engine.

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rerunner::engine::{RerunReport, RetryEngine};
use rerunner::io::discover::{Discovery, discover_commands};
use rerunner::options::{Backend, RunOptions};
use rerunner::test_support::spec_tree;

#[test]
fn all_passing_batch_reports_no_failures() {
    let commands: Vec<String> = (0..10).map(|n| format!("echo spec-{n}")).collect();
    let options = RunOptions {
        max_session_count: 3,
        ..RunOptions::default()
    };

    let report = RetryEngine::new(options).execute(commands);

    assert_eq!(report, RerunReport::default());
}

#[test]
fn failing_batch_without_hooks_fails_by_assert() {
    let commands = vec!["exit 1".to_string(), "exit 2".to_string()];
    let options = RunOptions {
        max_session_count: 2,
        ..RunOptions::default()
    };

    let report = RetryEngine::new(options).execute(commands);

    assert!(report.failed_commands.is_empty());
    assert_eq!(report.failed_by_assert.len(), 2);
}

#[test]
fn watchdog_kills_an_overlong_command() {
    let options = RunOptions {
        retry_count: 0,
        process_timeout: Duration::from_millis(200),
        ..RunOptions::default()
    };
    let started = Instant::now();

    let report = RetryEngine::new(options).execute(vec!["sleep 5".to_string()]);

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(report.failed_commands, vec!["sleep 5".to_string()]);
    assert!(report.failed_by_assert.is_empty());
}

#[test]
fn attempt_variable_reaches_the_child_environment() {
    let dir = spec_tree(&[]).expect("tempdir");
    let log = dir.path().join("attempts.log");
    let command = format!(
        "sh -c 'echo $RERUN_ATTEMPT' >> {}; exit 1",
        log.display()
    );
    let options = RunOptions {
        retry_count: 1,
        attempt_env_var: Some("RERUN_ATTEMPT".to_string()),
        stack_analyzer: Some(Arc::new(|_: &str| true)),
        ..RunOptions::default()
    };

    let report = RetryEngine::new(options).execute(vec![command]);

    assert_eq!(report.failed_commands.len(), 1);
    let seen = fs::read_to_string(&log).expect("read attempts log");
    let attempts: Vec<&str> = seen.lines().collect();
    assert_eq!(attempts, vec!["0", "1"]);
}

#[test]
fn rewriter_can_repair_a_command_between_attempts() {
    let options = RunOptions {
        retry_count: 2,
        rewriter: Some(Arc::new(|_: &str, _: &str, _: &[String]| "true".to_string())),
        ..RunOptions::default()
    };

    let report = RetryEngine::new(options).execute(vec!["false".to_string()]);

    assert_eq!(report, RerunReport::default());
}

#[test]
fn captured_output_feeds_the_stack_analyzer() {
    // The failure output decides retryability: one command prints a
    // transient-looking marker, the other an assertion.
    let options = RunOptions {
        retry_count: 1,
        stack_analyzer: Some(Arc::new(|output: &str| output.contains("ECONNRESET"))),
        ..RunOptions::default()
    };
    let commands = vec![
        "echo ECONNRESET; exit 1".to_string(),
        "echo AssertionError 1>&2; exit 1".to_string(),
    ];

    let report = RetryEngine::new(options).execute(commands);

    assert_eq!(
        report.failed_commands,
        vec!["echo ECONNRESET; exit 1".to_string()]
    );
    assert_eq!(
        report.failed_by_assert,
        vec!["echo AssertionError 1>&2; exit 1".to_string()]
    );
}

#[test]
fn streaming_backend_runs_a_batch() {
    let options = RunOptions {
        backend: Backend::Streaming,
        ..RunOptions::default()
    };

    let report = RetryEngine::new(options).execute(vec!["echo streamed".to_string()]);

    assert_eq!(report, RerunReport::default());
}

#[test]
fn discovered_specs_run_through_the_engine() {
    let dir = spec_tree(&["suite/a.spec.js", "suite/b.spec.js", "notes.md"]).expect("spec tree");
    let discovery = Discovery {
        specs_dir: dir.path().to_path_buf(),
        template: "echo running {{ file }}".to_string(),
        grep: ".spec".to_string(),
        skip_dirs: Vec::new(),
    };
    let commands = discover_commands(&discovery).expect("discover");
    assert_eq!(commands.len(), 2);

    let report = RetryEngine::new(RunOptions::default()).execute(commands);

    assert_eq!(report, RerunReport::default());
}
