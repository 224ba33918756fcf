//! In-memory container runtime that records every call

use localai_core::errors::{LaunchError, Result};
use localai_core::runtime::{ComposeAction, ComposeInvocation, ContainerRuntime};
use std::collections::BTreeSet;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    compose_calls: Vec<ComposeInvocation>,
    running: Vec<String>,
    files: BTreeSet<(String, String)>,
    volumes: Vec<String>,
    networks: Vec<String>,
    removed_volumes: Vec<String>,
    removed_networks: Vec<String>,
    fail_compose_up: bool,
    fail_compose_down: bool,
    fail_listing: bool,
}

/// Stand-in for the docker CLI.
///
/// Compose calls are recorded rather than run; containers, files, volumes and
/// networks are whatever the test scripted.
#[derive(Default)]
pub struct RecordingRuntime {
    state: Mutex<State>,
}

fn failed(command: &str) -> LaunchError {
    LaunchError::CommandFailed {
        command: command.to_string(),
        code: Some(1),
    }
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// A running container, optionally holding `file`
    pub fn with_container(self, name: &str, file: Option<&str>) -> Self {
        self.with_state(|s| {
            s.running.push(name.to_string());
            if let Some(file) = file {
                s.files.insert((name.to_string(), file.to_string()));
            }
        })
    }

    pub fn with_volumes(self, volumes: &[&str]) -> Self {
        self.with_state(|s| s.volumes.extend(volumes.iter().map(|v| v.to_string())))
    }

    pub fn with_networks(self, networks: &[&str]) -> Self {
        self.with_state(|s| s.networks.extend(networks.iter().map(|n| n.to_string())))
    }

    /// Every `compose ... up` exits non-zero
    pub fn failing_up(self) -> Self {
        self.with_state(|s| s.fail_compose_up = true)
    }

    /// Every `compose ... down` exits non-zero
    pub fn failing_down(self) -> Self {
        self.with_state(|s| s.fail_compose_down = true)
    }

    /// `ps`, `exec` and the volume and network listings fail
    pub fn failing_queries(self) -> Self {
        self.with_state(|s| s.fail_listing = true)
    }

    pub fn compose_calls(&self) -> Vec<ComposeInvocation> {
        self.state.lock().unwrap().compose_calls.clone()
    }

    /// Recorded compose calls rendered as argument vectors
    pub fn compose_args(&self) -> Vec<Vec<String>> {
        self.compose_calls().iter().map(ComposeInvocation::args).collect()
    }

    pub fn removed_volumes(&self) -> Vec<String> {
        self.state.lock().unwrap().removed_volumes.clone()
    }

    pub fn removed_networks(&self) -> Vec<String> {
        self.state.lock().unwrap().removed_networks.clone()
    }
}

impl ContainerRuntime for RecordingRuntime {
    async fn compose(&self, invocation: &ComposeInvocation) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.compose_calls.push(invocation.clone());
        match invocation.action {
            ComposeAction::Up { .. } if state.fail_compose_up => Err(failed("docker compose up")),
            ComposeAction::Down { .. } if state.fail_compose_down => Err(failed("docker compose down")),
            ComposeAction::Down { volumes: true, .. } => {
                // compose drops the project's named volumes itself
                let project = invocation.project.clone();
                state.volumes.retain(|v| !v.starts_with(&format!("{}_", project)));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn running_containers(&self, name_filter: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(failed("docker ps"));
        }
        Ok(state
            .running
            .iter()
            .filter(|c| c.contains(name_filter))
            .cloned()
            .collect())
    }

    async fn container_has_file(&self, container: &str, path: &str) -> Result<bool> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(failed("docker exec"));
        }
        Ok(state
            .files
            .contains(&(container.to_string(), path.to_string())))
    }

    async fn volumes(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(failed("docker volume ls"));
        }
        Ok(state.volumes.clone())
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.volumes.retain(|v| v != name);
        state.removed_volumes.push(name.to_string());
        Ok(())
    }

    async fn networks(&self, name_filter: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.fail_listing {
            return Err(failed("docker network ls"));
        }
        Ok(state
            .networks
            .iter()
            .filter(|n| n.contains(name_filter))
            .cloned()
            .collect())
    }

    async fn remove_network(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.networks.retain(|n| n != id);
        state.removed_networks.push(id.to_string());
        Ok(())
    }
}
