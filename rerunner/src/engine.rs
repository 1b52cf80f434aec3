//! Multi-cycle retry orchestration.

use tracing::info;

use crate::cycle::run_cycle;
use crate::io::launch::{BufferedLauncher, Launcher, StreamingLauncher};
use crate::options::{Backend, RunOptions};

/// Final outcome of an engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RerunReport {
    /// Commands still rescheduled when attempts ran out (or, with zero
    /// retries, every failure from the single batch).
    pub failed_commands: Vec<String>,
    /// Permanent failures accumulated across all attempts.
    pub failed_by_assert: Vec<String>,
}

impl RerunReport {
    pub fn total_failed(&self) -> usize {
        self.failed_commands.len() + self.failed_by_assert.len()
    }
}

/// Drives attempt cycles until nothing is left to retry or attempts are
/// exhausted.
pub struct RetryEngine {
    options: RunOptions,
    launcher: Box<dyn Launcher>,
}

impl RetryEngine {
    /// Engine with the backend selected by the options.
    pub fn new(options: RunOptions) -> Self {
        let launcher: Box<dyn Launcher> = match options.backend {
            Backend::Buffered => Box::new(BufferedLauncher),
            Backend::Streaming => Box::new(StreamingLauncher),
        };
        Self { options, launcher }
    }

    /// Engine with a caller-supplied launcher. Tests use scripted ones.
    pub fn with_launcher(options: RunOptions, launcher: Box<dyn Launcher>) -> Self {
        Self { options, launcher }
    }

    /// Execute the batch through every configured attempt cycle.
    ///
    /// Attempt 0 runs `commands`; attempt k runs the lines attempt k-1
    /// rescheduled. The loop has two independent exits: a cycle that
    /// reschedules nothing (nothing left to retry), and attempt
    /// `retry_count` completing (attempts exhausted). Individual command
    /// failures never abort the run.
    pub fn execute(&self, commands: Vec<String>) -> RerunReport {
        // With no retry budget there is no reschedule path; failures are
        // reported directly and classification never runs.
        let classify_failures = self.options.retry_count > 0;
        let mut failed_by_assert = Vec::new();
        let mut queue = commands;
        let mut attempt = 0u32;

        while !queue.is_empty() {
            info!(attempt, processes = queue.len(), "starting attempt cycle");
            queue = run_cycle(
                queue,
                attempt,
                &self.options,
                self.launcher.as_ref(),
                &mut failed_by_assert,
                classify_failures,
            );
            if queue.is_empty() {
                break;
            }
            if attempt >= self.options.retry_count {
                break;
            }
            attempt += 1;
        }

        let report = RerunReport {
            failed_commands: queue,
            failed_by_assert,
        };
        info!(failed = report.total_failed(), "failed processes count");
        report
    }
}
