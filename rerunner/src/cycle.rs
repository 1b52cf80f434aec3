//! One attempt cycle: drain a command queue through the session pool and
//! classify what comes back.
//!
//! Workers only prepare and launch; classification runs on the
//! orchestrating thread in completion order, so the growing
//! permanent-failure list has a single owner and the rewriter hook always
//! sees a consistent view of it.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::core::classifier::{Verdict, classify};
use crate::core::command::prepare_command;
use crate::core::time_fmt::format_mm_ss;
use crate::io::launch::{CommandOutcome, LaunchSpec, Launcher};
use crate::options::RunOptions;
use crate::pool;

/// A finished command as reported by a pool worker.
struct CompletedCommand {
    /// Attempt-var-injected line without decoration; a reschedule starts
    /// from this.
    executed: String,
    outcome: CommandOutcome,
}

/// Run one cycle over `commands` at `attempt`, appending permanent failures
/// to `failed_by_assert`. Returns the lines to run in the next cycle.
///
/// When `classify_failures` is false every failure is returned for rerun
/// reporting instead of being classified (the zero-retry path).
pub fn run_cycle(
    commands: Vec<String>,
    attempt: u32,
    options: &RunOptions,
    launcher: &dyn Launcher,
    failed_by_assert: &mut Vec<String>,
    classify_failures: bool,
) -> Vec<String> {
    let mut reschedule = Vec::new();

    pool::drain(
        commands,
        options.max_session_count,
        |line: String| run_one(&line, attempt, options, launcher),
        |done: CompletedCommand| {
            if done.outcome.success() {
                debug!(command = done.executed.as_str(), "command succeeded");
                return;
            }
            if !classify_failures {
                reschedule.push(done.executed);
                return;
            }
            match classify(
                &done.executed,
                &done.outcome.output,
                options.stack_analyzer.as_ref(),
                options.rewriter.as_ref(),
                failed_by_assert,
            ) {
                Verdict::Reschedule(line) => reschedule.push(line),
                Verdict::FailedByAssert => failed_by_assert.push(done.executed),
            }
        },
    );

    if let Some(callback) = &options.cycle_callback
        && let Err(err) = callback()
    {
        warn!(err = %format!("{err:#}"), "end-of-cycle callback failed");
    }

    info!(attempt, rescheduled = reschedule.len(), "cycle drained");
    reschedule
}

fn run_one(
    line: &str,
    attempt: u32,
    options: &RunOptions,
    launcher: &dyn Launcher,
) -> CompletedCommand {
    let prepared = prepare_command(
        line,
        attempt,
        options.attempt_env_var.as_deref(),
        options.decorator.as_ref(),
    );
    let spec = LaunchSpec {
        timeout: options.process_timeout,
        output_limit_bytes: options.output_limit_bytes,
    };

    let started = Instant::now();
    let outcome = match launcher.launch(&prepared.launch, &spec) {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(
                command = prepared.launch.as_str(),
                err = %format!("{err:#}"),
                "process failed to launch"
            );
            CommandOutcome::spawn_failure(format!("{err:#}"), started.elapsed())
        }
    };

    if outcome.killed_by_watchdog {
        warn!(
            command = prepared.launch.as_str(),
            duration = %format_mm_ss(outcome.duration),
            "process killed after exceeding the watchdog limit"
        );
    }
    if options.debug {
        info!(
            command = prepared.launch.as_str(),
            pid = outcome.pid,
            exit_code = ?outcome.exit_code,
            duration = %format_mm_ss(outcome.duration),
            "process finished"
        );
    }

    if let Some(after_run) = prepared.after_run {
        after_run();
    }

    CompletedCommand {
        executed: prepared.executed,
        outcome,
    }
}
