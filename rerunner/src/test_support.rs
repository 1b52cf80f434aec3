//! Test-only fakes and fixtures: a scripted launcher and temp spec trees.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;

use crate::io::launch::{CommandOutcome, LaunchSpec, Launcher};

/// Scripted response for one launched line.
pub struct ScriptedOutcome {
    pub exit_code: i32,
    pub output: String,
}

/// Launcher that consults a script instead of spawning processes.
///
/// Records every launched line and the concurrency high-water mark, so
/// tests can assert the session bound and which attempts actually ran.
pub struct ScriptedLauncher {
    script: Box<dyn Fn(&str) -> ScriptedOutcome + Send + Sync>,
    delay: Duration,
    launched: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedLauncher {
    pub fn new(script: impl Fn(&str) -> ScriptedOutcome + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            delay: Duration::ZERO,
            launched: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold each launch open for `delay` so concurrency is observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every line launched so far, in launch order.
    pub fn launched(&self) -> Vec<String> {
        self.launched
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn launch_count(&self) -> usize {
        self.launched().len()
    }

    /// Highest number of simultaneously open launches observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Launcher for ScriptedLauncher {
    fn launch(&self, line: &str, _spec: &LaunchSpec) -> Result<CommandOutcome> {
        if let Ok(mut launched) = self.launched.lock() {
            launched.push(line.to_string());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let scripted = (self.script)(line);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(CommandOutcome {
            exit_code: Some(scripted.exit_code),
            pid: None,
            output: scripted.output,
            duration: self.delay,
            killed_by_watchdog: false,
            truncated_bytes: 0,
        })
    }
}

/// Launcher whose spawn always fails, for exercising the spawn-error path.
pub struct FailingLauncher;

impl Launcher for FailingLauncher {
    fn launch(&self, _line: &str, _spec: &LaunchSpec) -> Result<CommandOutcome> {
        Err(anyhow::anyhow!("no such binary"))
    }
}

/// Materialize a spec-file tree in a temp dir. Each entry is a relative
/// path; parent directories are created as needed.
pub fn spec_tree(files: &[&str]) -> Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    for rel in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, "")?;
    }
    Ok(dir)
}
