//! External command execution for git and the container runtime

use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{LaunchError, Result};

/// A program, its arguments and the directory to run it in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program and arguments (e.g. `["docker", "compose", "-p", "localai", "down"]`)
    pub program_and_args: Vec<String>,
    pub working_dir: PathBuf,
}

/// Captured result of a command whose output matters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub code: Option<i32>,
}

impl CommandSpec {
    pub fn new<I, S>(program_and_args: I, working_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program_and_args: program_and_args.into_iter().map(Into::into).collect(),
            working_dir: working_dir.into(),
        }
    }

    /// The command line as shown in logs and error messages
    pub fn display(&self) -> String {
        self.program_and_args.join(" ")
    }

    fn command(&self) -> Result<Command> {
        let (program, args) = self.program_and_args.split_first().ok_or_else(|| {
            LaunchError::CommandSpawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            }
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&self.working_dir).stdin(Stdio::null());
        Ok(cmd)
    }

    /// Run with inherited stdout/stderr; a non-zero exit is an error.
    pub async fn run_checked(&self) -> Result<()> {
        info!("Running: {}", self.display());
        let status = self
            .command()?
            .status()
            .await
            .map_err(|source| LaunchError::CommandSpawn {
                command: self.display(),
                source,
            })?;

        if !status.success() {
            return Err(LaunchError::CommandFailed {
                command: self.display(),
                code: status.code(),
            });
        }
        Ok(())
    }

    /// Run quietly and capture stdout. Exit status is reported, not enforced.
    pub async fn capture(&self) -> Result<CommandOutput> {
        debug!("Running: {}", self.display());
        let output = self
            .command()?
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| LaunchError::CommandSpawn {
                command: self.display(),
                source,
            })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            code: output.status.code(),
        })
    }

    /// Capture stdout of a query whose failure must not pass for an empty answer
    pub async fn capture_checked(&self) -> Result<String> {
        let output = self.capture().await?;
        if !output.success {
            return Err(LaunchError::CommandFailed {
                command: self.display(),
                code: output.code,
            });
        }
        Ok(output.stdout)
    }
}
