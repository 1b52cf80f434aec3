//! Concurrent retrying command execution engine.
//!
//! Executes a batch of opaque shell commands (typically one end-to-end
//! test-runner invocation per spec file) under a bounded concurrency limit,
//! enforces a per-process watchdog timeout, and retries failures across
//! attempt cycles. Assertion-style failures are recorded once and never
//! retried; transient failures are rescheduled until the batch is clean or
//! attempts run out. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic decision logic (command preparation,
//!   failure classification). No process or filesystem side effects.
//! - **[`io`]**: Side-effecting operations (process launch backends, spec
//!   discovery, file configuration). Isolated to enable scripted fakes in
//!   tests.
//!
//! Orchestration modules ([`pool`], [`cycle`], [`engine`]) coordinate core
//! logic with I/O to drive a full run.

pub mod core;
pub mod cycle;
pub mod engine;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod options;
pub mod pool;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
