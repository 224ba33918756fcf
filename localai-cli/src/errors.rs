use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Project directory not found: {0}")]
    ProjectNotFound(PathBuf),

    #[error("{0}")]
    Launch(#[from] localai_core::LaunchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
