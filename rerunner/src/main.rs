//! CLI for the retrying command executor.
//!
//! Commands come either from positional arguments or from a spec-directory
//! walk. Numeric flags are parsed leniently: a malformed value falls back
//! to its default with a warning instead of aborting the batch.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rerunner::engine::{RerunReport, RetryEngine};
use rerunner::exit_codes;
use rerunner::io::config::{self, FileConfig};
use rerunner::io::discover::{Discovery, discover_commands};
use rerunner::logging;
use rerunner::options::{
    DEFAULT_OUTPUT_LIMIT_BYTES, DEFAULT_PROCESS_TIMEOUT, DEFAULT_RETRY_COUNT,
    DEFAULT_SESSION_COUNT, RunOptions,
};

#[derive(Parser)]
#[command(
    name = "rerunner",
    version,
    about = "Run flaky command batches with bounded concurrency and retries"
)]
struct Cli {
    /// Commands to execute; discovered from the spec directory when omitted.
    commands: Vec<String>,

    /// Path to a TOML config file.
    #[arg(long, default_value = "rerunner.toml")]
    config: PathBuf,

    /// Maximum number of concurrently running commands.
    #[arg(long)]
    sessions: Option<String>,

    /// Retry cycles after the initial attempt.
    #[arg(long)]
    retries: Option<String>,

    /// Per-process watchdog timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<String>,

    /// Captured-output limit per process in bytes.
    #[arg(long)]
    output_limit_bytes: Option<String>,

    /// Execution backend: buffered or streaming.
    #[arg(long)]
    backend: Option<String>,

    /// Environment variable that carries the attempt index into commands.
    #[arg(long)]
    attempt_env_var: Option<String>,

    /// Directory walked for spec files when no commands are given.
    #[arg(long)]
    specs_dir: Option<PathBuf>,

    /// Substring a discovered command must contain to be kept.
    #[arg(long)]
    grep: Option<String>,

    /// Template rendering a spec file into a command ({{ file }}).
    #[arg(long)]
    template: Option<String>,

    /// Log per-process detail (command, pid, exit code, duration).
    #[arg(long)]
    debug: bool,
}

fn main() {
    logging::init();
    match run() {
        Ok(report) => {
            println!("Failed processes count: {}", report.total_failed());
            if report.total_failed() > 0 {
                std::process::exit(exit_codes::FAILED);
            }
        }
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<RerunReport> {
    let cli = Cli::parse();
    let file = FileConfig::load(&cli.config)?;

    let options = RunOptions {
        max_session_count: config::resolve_numeric(
            cli.sessions.as_deref(),
            file.sessions.as_ref(),
            DEFAULT_SESSION_COUNT as u64,
            "sessions",
        ) as usize,
        retry_count: config::resolve_numeric(
            cli.retries.as_deref(),
            file.retries.as_ref(),
            u64::from(DEFAULT_RETRY_COUNT),
            "retries",
        ) as u32,
        process_timeout: Duration::from_millis(config::resolve_numeric(
            cli.timeout_ms.as_deref(),
            file.timeout_ms.as_ref(),
            DEFAULT_PROCESS_TIMEOUT.as_millis() as u64,
            "timeout_ms",
        )),
        output_limit_bytes: config::resolve_numeric(
            cli.output_limit_bytes.as_deref(),
            file.output_limit_bytes.as_ref(),
            DEFAULT_OUTPUT_LIMIT_BYTES as u64,
            "output_limit_bytes",
        ) as usize,
        backend: config::backend_or_default(cli.backend.as_deref().or(file.backend.as_deref())),
        attempt_env_var: cli.attempt_env_var.or(file.attempt_env_var),
        debug: cli.debug || file.debug.unwrap_or(false),
        ..RunOptions::default()
    };

    let commands = if cli.commands.is_empty() {
        let defaults = Discovery::default();
        let discovery = Discovery {
            specs_dir: cli
                .specs_dir
                .or_else(|| file.specs_dir.map(PathBuf::from))
                .unwrap_or(defaults.specs_dir),
            template: cli.template.or(file.template).unwrap_or(defaults.template),
            grep: cli.grep.or(file.grep).unwrap_or(defaults.grep),
            skip_dirs: file.skip_dirs,
        };
        discover_commands(&discovery)?
    } else {
        cli.commands
    };

    Ok(RetryEngine::new(options).execute(commands))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positional_commands() {
        let cli = Cli::parse_from(["rerunner", "echo one", "echo two"]);
        assert_eq!(cli.commands, vec!["echo one", "echo two"]);
        assert!(cli.sessions.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn parse_engine_flags() {
        let cli = Cli::parse_from([
            "rerunner",
            "--sessions",
            "3",
            "--retries",
            "1",
            "--backend",
            "streaming",
            "--debug",
        ]);
        assert_eq!(cli.sessions.as_deref(), Some("3"));
        assert_eq!(cli.retries.as_deref(), Some("1"));
        assert_eq!(cli.backend.as_deref(), Some("streaming"));
        assert!(cli.debug);
    }

    #[test]
    fn parse_discovery_flags() {
        let cli = Cli::parse_from([
            "rerunner",
            "--specs-dir",
            "./e2e",
            "--grep",
            ".spec",
            "--template",
            "npx runner {{ file }}",
        ]);
        assert_eq!(cli.specs_dir, Some(PathBuf::from("./e2e")));
        assert_eq!(cli.grep.as_deref(), Some(".spec"));
        assert_eq!(cli.template.as_deref(), Some("npx runner {{ file }}"));
    }
}
