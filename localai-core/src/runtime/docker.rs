use std::path::PathBuf;

use super::{ComposeInvocation, ContainerRuntime};
use crate::errors::Result;
use crate::process::CommandSpec;

/// Drives the `docker` CLI
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    working_dir: PathBuf,
}

impl DockerCli {
    /// Run `docker` from `working_dir`, where relative compose paths resolve
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self::with_program("docker", working_dir)
    }

    fn with_program(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            working_dir: working_dir.into(),
        }
    }

    fn spec<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut program_and_args = vec![self.program.clone()];
        program_and_args.extend(args.into_iter().map(Into::into));
        CommandSpec::new(program_and_args, self.working_dir.clone())
    }

    async fn lines(&self, args: &[&str]) -> Result<Vec<String>> {
        let stdout = self.spec(args.iter().copied()).capture_checked().await?;
        Ok(non_empty_lines(&stdout))
    }
}

fn non_empty_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

impl ContainerRuntime for DockerCli {
    async fn compose(&self, invocation: &ComposeInvocation) -> Result<()> {
        self.spec(invocation.args()).run_checked().await
    }

    async fn running_containers(&self, name_filter: &str) -> Result<Vec<String>> {
        let filter = format!("name={}", name_filter);
        self.lines(&["ps", "--filter", &filter, "--format", "{{.Names}}"])
            .await
    }

    async fn container_has_file(&self, container: &str, path: &str) -> Result<bool> {
        let output = self
            .spec(["exec", container, "test", "-f", path])
            .capture()
            .await?;
        Ok(output.success)
    }

    async fn volumes(&self) -> Result<Vec<String>> {
        self.lines(&["volume", "ls", "-q"]).await
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        self.spec(["volume", "rm", name]).run_checked().await
    }

    async fn networks(&self, name_filter: &str) -> Result<Vec<String>> {
        let filter = format!("name={}", name_filter);
        self.lines(&["network", "ls", "--filter", &filter, "-q"]).await
    }

    async fn remove_network(&self, id: &str) -> Result<()> {
        self.spec(["network", "rm", id]).run_checked().await
    }
}
