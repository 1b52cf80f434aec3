//! File configuration and lenient option coercion.
//!
//! Numeric options arrive untyped (TOML values or CLI strings). A malformed
//! value never fails the run: it falls back to the documented default with
//! a warning, so a typo in one knob cannot abort a long test batch.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use toml::Value;
use tracing::warn;

use crate::options::Backend;

/// On-disk configuration (TOML). Missing fields default; unknown backend
/// names and non-numeric values are coerced with a warning.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub sessions: Option<Value>,
    pub retries: Option<Value>,
    pub timeout_ms: Option<Value>,
    pub output_limit_bytes: Option<Value>,
    pub backend: Option<String>,
    pub attempt_env_var: Option<String>,
    pub debug: Option<bool>,
    pub specs_dir: Option<String>,
    pub grep: Option<String>,
    pub template: Option<String>,
    pub skip_dirs: Vec<String>,
}

impl FileConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
    }
}

/// Resolve a numeric option from a CLI override and a file value, in that
/// precedence, coercing leniently.
pub fn resolve_numeric(cli: Option<&str>, file: Option<&Value>, default: u64, name: &str) -> u64 {
    match cli {
        Some(raw) => parse_numeric(raw, default, name),
        None => numeric_or_default(file, default, name),
    }
}

/// Coerce an optional TOML value, warning and falling back on anything that
/// is not a non-negative number.
pub fn numeric_or_default(raw: Option<&Value>, default: u64, name: &str) -> u64 {
    match raw {
        None => default,
        Some(Value::Integer(n)) if *n >= 0 => *n as u64,
        Some(Value::String(s)) => parse_numeric(s, default, name),
        Some(other) => {
            warn!(option = name, value = ?other, default, "option should be a number, using default");
            default
        }
    }
}

/// Parse a numeric string value, warning and falling back when malformed.
pub fn parse_numeric(raw: &str, default: u64, name: &str) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(value) => value,
        Err(_) => {
            warn!(option = name, value = raw, default, "option should be a number, using default");
            default
        }
    }
}

/// Coerce a backend name; unknown names fall back to the buffered backend.
pub fn backend_or_default(raw: Option<&str>) -> Backend {
    match raw {
        None => Backend::default(),
        Some(name) => match name.trim().to_ascii_lowercase().as_str() {
            "buffered" => Backend::Buffered,
            "streaming" => Backend::Streaming,
            _ => {
                warn!(backend = name, "unknown backend, using buffered");
                Backend::Buffered
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = FileConfig::load(&temp.path().join("missing.toml")).expect("load");
        assert!(config.sessions.is_none());
        assert!(config.skip_dirs.is_empty());
    }

    #[test]
    fn load_reads_partial_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rerunner.toml");
        fs::write(&path, "sessions = 3\nskip_dirs = [\"helpers\"]\n").expect("write");
        let config = FileConfig::load(&path).expect("load");
        assert_eq!(numeric_or_default(config.sessions.as_ref(), 5, "sessions"), 3);
        assert_eq!(config.skip_dirs, vec!["helpers".to_string()]);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let value = Value::String("12".to_string());
        assert_eq!(numeric_or_default(Some(&value), 5, "sessions"), 12);
    }

    #[test]
    fn malformed_numbers_fall_back_to_the_default() {
        assert_eq!(parse_numeric("five", 5, "sessions"), 5);
        let value = Value::Boolean(true);
        assert_eq!(numeric_or_default(Some(&value), 7, "retries"), 7);
        let negative = Value::Integer(-3);
        assert_eq!(numeric_or_default(Some(&negative), 7, "retries"), 7);
    }

    #[test]
    fn cli_value_wins_over_file_value() {
        let file = Value::Integer(9);
        assert_eq!(resolve_numeric(Some("4"), Some(&file), 5, "sessions"), 4);
        assert_eq!(resolve_numeric(None, Some(&file), 5, "sessions"), 9);
    }

    #[test]
    fn unknown_backend_falls_back_to_buffered() {
        assert_eq!(backend_or_default(Some("Streaming")), Backend::Streaming);
        assert_eq!(backend_or_default(Some("fancy")), Backend::Buffered);
        assert_eq!(backend_or_default(None), Backend::Buffered);
    }
}
