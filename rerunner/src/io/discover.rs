//! Discovery of the initial command batch from a spec directory tree.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use tracing::debug;
use walkdir::WalkDir;

/// Settings for turning a spec tree into a command batch.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub specs_dir: PathBuf,
    /// Template rendered once per file with a `file` variable, e.g.
    /// `npx protractor conf.js --specs {{ file }}`.
    pub template: String,
    /// Substring a rendered command must contain to be kept.
    pub grep: String,
    /// Directory names excluded from the walk.
    pub skip_dirs: Vec<String>,
}

impl Default for Discovery {
    fn default() -> Self {
        Self {
            specs_dir: PathBuf::from("./specs"),
            template: "{{ file }}".to_string(),
            grep: ".spec".to_string(),
            skip_dirs: Vec::new(),
        }
    }
}

/// Walk the spec directory and render one command per file, filtered by the
/// grep word. Files are sorted so the initial queue order is deterministic.
pub fn discover_commands(discovery: &Discovery) -> Result<Vec<String>> {
    let files = spec_files(&discovery.specs_dir, &discovery.skip_dirs)?;
    let mut env = Environment::new();
    env.add_template("command", &discovery.template)
        .context("parse command template")?;
    let template = env.get_template("command")?;

    let mut commands = Vec::new();
    for file in files {
        let line = template
            .render(context! { file => file.display().to_string() })
            .with_context(|| format!("render command for {}", file.display()))?;
        if line.contains(&discovery.grep) {
            commands.push(line);
        }
    }
    debug!(count = commands.len(), "discovered commands");
    Ok(commands)
}

/// All files under `dir`, skipping directories by name, sorted.
pub fn spec_files(dir: &Path, skip_dirs: &[String]) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        !(entry.file_type().is_dir()
            && entry.depth() > 0
            && skip_dirs
                .iter()
                .any(|skip| entry.file_name() == OsStr::new(skip)))
    });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("walk {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spec_tree;

    #[test]
    fn walk_skips_directories_by_name() {
        let dir = spec_tree(&[
            "login/auth.spec.js",
            "login/helpers/setup.spec.js",
            "cart/cart.spec.js",
        ])
        .expect("spec tree");
        let files = spec_files(dir.path(), &["helpers".to_string()]).expect("walk");
        let names: Vec<String> = files
            .iter()
            .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .collect();
        assert_eq!(names, vec!["cart.spec.js", "auth.spec.js"]);
    }

    #[test]
    fn commands_are_rendered_and_filtered() {
        let dir = spec_tree(&["a.spec.js", "notes.txt"]).expect("spec tree");
        let discovery = Discovery {
            specs_dir: dir.path().to_path_buf(),
            template: "npx runner conf.js --specs {{ file }}".to_string(),
            grep: ".spec".to_string(),
            skip_dirs: Vec::new(),
        };
        let commands = discover_commands(&discovery).expect("discover");
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with("npx runner conf.js --specs "));
        assert!(commands[0].ends_with("a.spec.js"));
    }

    #[test]
    fn grep_word_filters_rendered_lines() {
        let dir = spec_tree(&["one.spec.js", "two.spec.js"]).expect("spec tree");
        let discovery = Discovery {
            specs_dir: dir.path().to_path_buf(),
            template: "run {{ file }}".to_string(),
            grep: "two".to_string(),
            skip_dirs: Vec::new(),
        };
        let commands = discover_commands(&discovery).expect("discover");
        assert_eq!(commands.len(), 1);
        assert!(commands[0].contains("two.spec.js"));
    }

    #[test]
    fn discovery_order_is_deterministic() {
        let dir = spec_tree(&["b.spec.js", "a.spec.js", "c.spec.js"]).expect("spec tree");
        let discovery = Discovery {
            specs_dir: dir.path().to_path_buf(),
            template: "{{ file }}".to_string(),
            grep: ".spec".to_string(),
            skip_dirs: Vec::new(),
        };
        let commands = discover_commands(&discovery).expect("discover");
        let sorted = {
            let mut copy = commands.clone();
            copy.sort();
            copy
        };
        assert_eq!(commands, sorted);
    }
}
