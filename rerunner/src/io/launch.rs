//! Child process launch backends: watchdog timeout and merged output
//! capture.
//!
//! Output is read concurrently while the child runs so pipes cannot
//! deadlock. stdout and stderr chunks land in a single buffer in arrival
//! order; no ordering is guaranteed between interleaved streams beyond
//! that. `output_limit_bytes` bounds what is kept in memory (bytes beyond
//! it are discarded while still draining the pipes).

use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Limits applied to one launch.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

/// Result of one finished (or killed) child process.
#[derive(Debug)]
pub struct CommandOutcome {
    /// `None` when the child was terminated by a signal or never spawned.
    pub exit_code: Option<i32>,
    pub pid: Option<u32>,
    /// stdout and stderr chunks merged in arrival order.
    pub output: String,
    pub duration: Duration,
    pub killed_by_watchdog: bool,
    /// Bytes discarded once the capture limit was reached.
    pub truncated_bytes: usize,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Synthetic outcome for a process that could not be launched at all.
    /// The run still resolves through the normal completion path, so the
    /// pool never waits on it.
    pub fn spawn_failure(message: String, duration: Duration) -> Self {
        Self {
            exit_code: None,
            pid: None,
            output: message,
            duration,
            killed_by_watchdog: false,
            truncated_bytes: 0,
        }
    }
}

/// Abstraction over child process execution backends.
pub trait Launcher: Send + Sync {
    /// Run `line` through the shell to completion or watchdog kill.
    fn launch(&self, line: &str, spec: &LaunchSpec) -> Result<CommandOutcome>;
}

/// Captures output without echoing it.
pub struct BufferedLauncher;

impl Launcher for BufferedLauncher {
    #[instrument(skip_all, fields(timeout_secs = spec.timeout.as_secs()))]
    fn launch(&self, line: &str, spec: &LaunchSpec) -> Result<CommandOutcome> {
        run_shell_line(line, spec, false)
    }
}

/// Echoes child output to the parent's stdout as it arrives, in addition to
/// capturing it.
pub struct StreamingLauncher;

impl Launcher for StreamingLauncher {
    #[instrument(skip_all, fields(timeout_secs = spec.timeout.as_secs()))]
    fn launch(&self, line: &str, spec: &LaunchSpec) -> Result<CommandOutcome> {
        run_shell_line(line, spec, true)
    }
}

fn run_shell_line(line: &str, spec: &LaunchSpec, echo: bool) -> Result<CommandOutcome> {
    let started = Instant::now();
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(line)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(command = line, "spawning child process");
    let mut child = cmd.spawn().context("spawn shell command")?;
    let pid = child.id();

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let capture = Arc::new(Mutex::new(CaptureBuffer::new(spec.output_limit_bytes)));
    let stdout_handle = {
        let capture = Arc::clone(&capture);
        thread::spawn(move || drain_stream(stdout, &capture, echo))
    };
    let stderr_handle = {
        let capture = Arc::clone(&capture);
        thread::spawn(move || drain_stream(stderr, &capture, echo))
    };

    let mut killed_by_watchdog = false;
    let status = match child.wait_timeout(spec.timeout).context("wait for command")? {
        Some(status) => status,
        None => {
            warn!(
                pid,
                timeout_secs = spec.timeout.as_secs(),
                "watchdog expired, killing process"
            );
            killed_by_watchdog = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    join_reader(stdout_handle).context("join stdout reader")?;
    join_reader(stderr_handle).context("join stderr reader")?;

    let captured = match Arc::try_unwrap(capture) {
        Ok(mutex) => match mutex.into_inner() {
            Ok(buffer) => buffer,
            Err(poisoned) => poisoned.into_inner(),
        },
        Err(_) => return Err(anyhow!("output capture still shared after join")),
    };
    if captured.truncated > 0 {
        warn!(truncated_bytes = captured.truncated, "captured output truncated");
    }

    let duration = started.elapsed();
    debug!(
        pid,
        exit_code = ?status.code(),
        killed_by_watchdog,
        duration_ms = duration.as_millis() as u64,
        "command finished"
    );
    Ok(CommandOutcome {
        exit_code: status.code(),
        pid: Some(pid),
        output: String::from_utf8_lossy(&captured.bytes).into_owned(),
        duration,
        killed_by_watchdog,
        truncated_bytes: captured.truncated,
    })
}

/// Arrival-order capture shared by the stdout and stderr readers.
struct CaptureBuffer {
    bytes: Vec<u8>,
    truncated: usize,
    limit: usize,
}

impl CaptureBuffer {
    fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            truncated: 0,
            limit,
        }
    }

    fn append(&mut self, chunk: &[u8]) {
        let remaining = self.limit.saturating_sub(self.bytes.len());
        let keep = chunk.len().min(remaining);
        self.bytes.extend_from_slice(&chunk[..keep]);
        self.truncated += chunk.len() - keep;
    }
}

fn drain_stream<R: Read>(mut reader: R, capture: &Mutex<CaptureBuffer>, echo: bool) -> Result<()> {
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).context("read child output")?;
        if n == 0 {
            break;
        }
        if echo {
            echo_chunk(&chunk[..n]);
        }
        if let Ok(mut buffer) = capture.lock() {
            buffer.append(&chunk[..n]);
        }
    }
    Ok(())
}

fn echo_chunk(chunk: &[u8]) {
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = stdout.write_all(chunk).and_then(|()| stdout.flush()) {
        warn!(err = %err, "failed to echo child output");
    }
}

fn join_reader(handle: thread::JoinHandle<Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}
