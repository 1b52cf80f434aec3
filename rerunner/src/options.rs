//! Engine configuration and caller-supplied hooks.
//!
//! A [`RunOptions`] value is immutable for the lifetime of one engine
//! instance. Hooks are optional closures shared across worker threads; the
//! engine calls them at fixed points (before launch, after a failure, after
//! a cycle drains) and never stores per-command state inside them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

/// Default number of concurrently running commands.
pub const DEFAULT_SESSION_COUNT: usize = 5;
/// Default number of retry cycles after the initial attempt.
pub const DEFAULT_RETRY_COUNT: u32 = 2;
/// Default per-process watchdog limit.
pub const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_millis(450_000);
/// Default captured-output bound per process.
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 1_024_000;

/// Inspects captured process output and decides whether a failure is
/// retry-worthy.
pub type StackAnalyzer = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Rewrites a failed command before rescheduling.
///
/// Receives the executed line, the captured output, and the permanent
/// failure list accumulated so far, enabling dynamic strategies such as
/// dropping a flag once a command has already failed.
pub type CommandRewriter = Arc<dyn Fn(&str, &str, &[String]) -> String + Send + Sync>;

/// Invoked exactly once after a decorated command finishes, success or
/// failure.
pub type AfterRun = Box<dyn FnOnce() + Send>;

/// A decorated command line plus its post-run callback.
pub struct Decorated {
    pub line: String,
    pub after_run: Option<AfterRun>,
}

/// Augments a command line right before launch.
///
/// The augmentation is transient: the engine reschedules the undecorated
/// line, so the decorator sees a clean command on every attempt.
pub type Decorator = Arc<dyn Fn(&str) -> Decorated + Send + Sync>;

/// Best-effort hook invoked after each attempt cycle drains. An `Err` is
/// logged and ignored.
pub type CycleCallback = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Execution backend for child processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Capture output without echoing it.
    #[default]
    Buffered,
    /// Echo child output to the parent's stdout as it arrives, in addition
    /// to capturing it.
    Streaming,
}

/// Configuration for one engine instance.
#[derive(Clone)]
pub struct RunOptions {
    /// Maximum number of concurrently running commands.
    pub max_session_count: usize,
    /// Number of retry cycles after the initial attempt. Zero means the
    /// batch runs exactly once and failures are reported without
    /// classification.
    pub retry_count: u32,
    /// Watchdog limit on per-process wall-clock time.
    pub process_timeout: Duration,
    /// Captured-output bound per process; bytes beyond it are discarded
    /// while the pipes are still drained.
    pub output_limit_bytes: usize,
    pub backend: Backend,
    /// Environment variable injected into the command line so the wrapped
    /// runner can see which attempt it is on.
    pub attempt_env_var: Option<String>,
    pub stack_analyzer: Option<StackAnalyzer>,
    pub rewriter: Option<CommandRewriter>,
    pub decorator: Option<Decorator>,
    pub cycle_callback: Option<CycleCallback>,
    /// Log per-process detail (command, pid, exit code, duration) at info
    /// level.
    pub debug: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            max_session_count: DEFAULT_SESSION_COUNT,
            retry_count: DEFAULT_RETRY_COUNT,
            process_timeout: DEFAULT_PROCESS_TIMEOUT,
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            backend: Backend::default(),
            attempt_env_var: None,
            stack_analyzer: None,
            rewriter: None,
            decorator: None,
            cycle_callback: None,
            debug: false,
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("max_session_count", &self.max_session_count)
            .field("retry_count", &self.retry_count)
            .field("process_timeout", &self.process_timeout)
            .field("output_limit_bytes", &self.output_limit_bytes)
            .field("backend", &self.backend)
            .field("attempt_env_var", &self.attempt_env_var)
            .field("stack_analyzer", &self.stack_analyzer.is_some())
            .field("rewriter", &self.rewriter.is_some())
            .field("decorator", &self.decorator.is_some())
            .field("cycle_callback", &self.cycle_callback.is_some())
            .field("debug", &self.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = RunOptions::default();
        assert_eq!(options.max_session_count, 5);
        assert_eq!(options.retry_count, 2);
        assert_eq!(options.process_timeout, Duration::from_millis(450_000));
        assert_eq!(options.output_limit_bytes, 1_024_000);
        assert_eq!(options.backend, Backend::Buffered);
        assert!(options.attempt_env_var.is_none());
        assert!(!options.debug);
    }

    #[test]
    fn debug_formatting_reports_hook_presence_not_contents() {
        let options = RunOptions {
            stack_analyzer: Some(Arc::new(|_| true)),
            ..RunOptions::default()
        };
        let rendered = format!("{:?}", options);
        assert!(rendered.contains("stack_analyzer: true"));
        assert!(rendered.contains("rewriter: false"));
    }
}
