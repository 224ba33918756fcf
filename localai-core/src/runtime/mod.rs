//! Container runtime interactions
//!
//! Everything the launcher asks of the container runtime goes through
//! [`ContainerRuntime`], so the bootstrap sequence can run against a fake in
//! tests. [`DockerCli`] is the real implementation.

mod docker;

pub use docker::DockerCli;

use std::path::PathBuf;

use crate::errors::Result;

/// Verb of a compose invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeAction {
    /// `up`, detached with `-d`
    Up { detach: bool },
    /// `down`, optionally dropping volumes and orphaned containers
    Down { volumes: bool, remove_orphans: bool },
}

impl ComposeAction {
    pub fn up() -> Self {
        ComposeAction::Up { detach: true }
    }

    pub fn down() -> Self {
        ComposeAction::Down {
            volumes: false,
            remove_orphans: false,
        }
    }
}

/// One `docker compose` call against the shared project namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeInvocation {
    pub project: String,
    pub profile: Option<String>,
    /// Stack definition files, in `-f` order
    pub files: Vec<PathBuf>,
    pub action: ComposeAction,
    /// Limit the operation to these services; empty means all
    pub services: Vec<String>,
}

impl ComposeInvocation {
    pub fn new(project: impl Into<String>, action: ComposeAction) -> Self {
        Self {
            project: project.into(),
            profile: None,
            files: Vec::new(),
            action,
            services: Vec::new(),
        }
    }

    pub fn with_profile(mut self, profile: Option<&str>) -> Self {
        self.profile = profile.map(String::from);
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.files.push(file.into());
        self
    }

    pub fn with_services(mut self, services: Vec<String>) -> Self {
        self.services = services;
        self
    }

    /// Arguments following the runtime binary, starting with `compose`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["compose".to_string(), "-p".to_string(), self.project.clone()];

        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }

        for file in &self.files {
            args.push("-f".to_string());
            args.push(file.to_string_lossy().into_owned());
        }

        match self.action {
            ComposeAction::Up { detach } => {
                args.push("up".to_string());
                if detach {
                    args.push("-d".to_string());
                }
            }
            ComposeAction::Down {
                volumes,
                remove_orphans,
            } => {
                args.push("down".to_string());
                if volumes {
                    args.push("-v".to_string());
                }
                if remove_orphans {
                    args.push("--remove-orphans".to_string());
                }
            }
        }

        args.extend(self.services.iter().cloned());
        args
    }
}

/// The subset of the container runtime the launcher drives.
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// Run a compose invocation; a non-zero exit is an error.
    async fn compose(&self, invocation: &ComposeInvocation) -> Result<()>;

    /// Names of running containers whose name matches `name_filter`.
    async fn running_containers(&self, name_filter: &str) -> Result<Vec<String>>;

    /// Whether `path` exists as a regular file inside a running container.
    async fn container_has_file(&self, container: &str, path: &str) -> Result<bool>;

    /// Names of all volumes.
    async fn volumes(&self) -> Result<Vec<String>>;

    async fn remove_volume(&self, name: &str) -> Result<()>;

    /// Ids of networks whose name matches `name_filter`.
    async fn networks(&self, name_filter: &str) -> Result<Vec<String>>;

    async fn remove_network(&self, id: &str) -> Result<()>;
}
