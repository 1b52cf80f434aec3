//! Command-line preparation: attempt-variable injection and decoration.
//!
//! A command is a structured value here: the engine tracks the undecorated
//! `executed` line separately from the decorated `launch` line, so transient
//! decoration never leaks into reschedules and cannot accumulate across
//! attempts.

use regex::{NoExpand, RegexBuilder};

use crate::options::{AfterRun, Decorator};

/// A command ready to launch.
pub struct PreparedCommand {
    /// The line the engine tracks and reschedules: attempt variable
    /// injected, no decoration.
    pub executed: String,
    /// The line actually handed to the launcher: `executed` plus the
    /// decorator's augmentation.
    pub launch: String,
    /// Callback from the decorator, invoked once after the run completes.
    pub after_run: Option<AfterRun>,
}

/// Prepare `line` for launch at `attempt`.
pub fn prepare_command(
    line: &str,
    attempt: u32,
    attempt_var: Option<&str>,
    decorator: Option<&Decorator>,
) -> PreparedCommand {
    let executed = match attempt_var {
        Some(var) => inject_attempt_var(line, var, attempt),
        None => line.to_string(),
    };
    match decorator {
        Some(decorate) => {
            let decorated = decorate(&executed);
            PreparedCommand {
                launch: decorated.line,
                after_run: decorated.after_run,
                executed,
            }
        }
        None => PreparedCommand {
            launch: executed.clone(),
            executed,
            after_run: None,
        },
    }
}

/// Inject `var=<attempt>` into a command line.
///
/// Every existing numeric assignment of `var` is replaced, matched
/// case-insensitively; a line without one gets a fresh assignment
/// prepended. Re-injection on a later attempt therefore updates the value
/// instead of stacking a second assignment.
pub fn inject_attempt_var(line: &str, var: &str, attempt: u32) -> String {
    let pattern = format!(r"{}=\d+", regex::escape(var));
    let assignment = format!("{var}={attempt}");
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) if re.is_match(line) => re.replace_all(line, NoExpand(&assignment)).into_owned(),
        _ => format!("{assignment} {line}"),
    }
}
