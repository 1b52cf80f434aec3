//! Stable exit codes for the rerunner CLI.

/// Every command finished with exit code 0 (possibly after retries).
pub const OK: i32 = 0;
/// At least one command remained failed after all attempt cycles.
pub const FAILED: i32 = 1;
/// The orchestration layer itself failed (bad config file, discovery error).
pub const INVALID: i32 = 2;
