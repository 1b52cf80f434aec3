//! Classification of failed command outcomes.

use crate::options::{CommandRewriter, StackAnalyzer};

/// Where a failed command goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Run again in the next cycle, possibly rewritten.
    Reschedule(String),
    /// No reschedule path applies: record as a permanent failure.
    FailedByAssert,
}

/// Decide the fate of a command that exited non-zero or was killed.
///
/// First match wins:
/// 1. A stack analyzer that recognizes the captured output reschedules the
///    same line unchanged.
/// 2. Otherwise a configured rewriter reschedules its result. The rewriter
///    also receives the permanent-failure list accumulated so far.
/// 3. Otherwise the failure is permanent.
///
/// Exit code 0 never reaches this function.
pub fn classify(
    executed: &str,
    output: &str,
    analyzer: Option<&StackAnalyzer>,
    rewriter: Option<&CommandRewriter>,
    failed_by_assert: &[String],
) -> Verdict {
    if let Some(analyzer) = analyzer
        && analyzer(output)
    {
        return Verdict::Reschedule(executed.to_string());
    }
    if let Some(rewriter) = rewriter {
        return Verdict::Reschedule(rewriter(executed, output, failed_by_assert));
    }
    Verdict::FailedByAssert
}
