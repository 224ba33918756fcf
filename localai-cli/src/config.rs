use crate::errors::{CliError, Result};
use localai_core::ProjectLayout;
use std::path::Path;

pub struct Config {}

impl Config {
    /// Resolve the project from `-C` or, failing that, the nearest ancestor of
    /// the current directory with a compose file (else the current directory).
    pub fn resolve_project(dir: Option<&Path>) -> Result<ProjectLayout> {
        match dir {
            Some(dir) => {
                if !dir.is_dir() {
                    return Err(CliError::ProjectNotFound(dir.to_path_buf()));
                }
                Ok(ProjectLayout::new(dir))
            }
            None => {
                let cwd = std::env::current_dir()?;
                Ok(ProjectLayout::discover(&cwd).unwrap_or_else(|| ProjectLayout::new(cwd)))
            }
        }
    }
}
