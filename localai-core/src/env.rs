//! Dotenv files: key scanning, drift against `.env.example`, and repair.
//!
//! Files are read line by line rather than evaluated. Values are never
//! expanded or unquoted, so an assignment can be copied from the example
//! exactly as written.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::errors::{LaunchError, Result};

/// Header written above variables appended by [`append_missing`]
pub const APPENDED_HEADER: &str = "# Added missing variables from .env.example";

/// The assignments of a dotenv file, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    /// Key to the line that assigns it, as written (the last one wins)
    lines: BTreeMap<String, String>,
}

impl EnvFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LaunchError::file(path, e))?;
        Ok(Self::parse(&content))
    }

    /// Scan `KEY=value` lines. Comments, blank lines and lines that are not
    /// assignments are skipped; an `export ` prefix is allowed.
    pub fn parse(content: &str) -> Self {
        let mut lines = BTreeMap::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let assignment = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            match assignment.split_once('=').map(|(key, _)| key.trim()) {
                Some(key) if is_key(key) => {
                    lines.insert(key.to_string(), line.to_string());
                }
                _ => debug!("Skipping line {} of env file: not an assignment", number + 1),
            }
        }

        EnvFile { lines }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lines.contains_key(key)
    }

    /// Keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.keys().map(String::as_str)
    }

    /// The line assigning `key`, as written
    pub fn line(&self, key: &str) -> Option<&str> {
        self.lines.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn is_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Keys that differ between a .env file and its example
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDrift {
    /// In the example but not in the file
    pub missing: Vec<String>,
    /// In the file but not in the example
    pub extra: Vec<String>,
}

impl EnvDrift {
    pub fn between(current: &EnvFile, example: &EnvFile) -> Self {
        let missing = example
            .keys()
            .filter(|k| !current.contains(k))
            .map(String::from)
            .collect();
        let extra = current
            .keys()
            .filter(|k| !example.contains(k))
            .map(String::from)
            .collect();
        EnvDrift { missing, extra }
    }

    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }
}

/// Append the example's assignments for `keys` to the end of the file at
/// `path`.
///
/// Existing content is kept byte for byte. Keys the example does not define
/// are written with an empty value.
pub fn append_missing(path: &Path, keys: &[String], example: &EnvFile) -> Result<()> {
    if keys.is_empty() {
        return Ok(());
    }

    let mut content = std::fs::read_to_string(path).map_err(|e| LaunchError::file(path, e))?;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push('\n');
    content.push_str(APPENDED_HEADER);
    content.push('\n');

    for key in keys {
        match example.line(key) {
            Some(line) => content.push_str(line.trim_start()),
            None => {
                content.push_str(key);
                content.push('=');
            }
        }
        content.push('\n');
    }

    std::fs::write(path, content).map_err(|e| LaunchError::file(path, e))
}
