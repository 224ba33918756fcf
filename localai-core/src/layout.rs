//! Host paths the launcher reads and mutates, all relative to the project root.

use std::path::{Path, PathBuf};

use crate::config::Environment;

/// Default compose project namespace shared by both stacks
pub const DEFAULT_PROJECT_NAME: &str = "localai";

/// Directory holding the backing-platform (Supabase) checkout
const PLATFORM_DIR: &str = "supabase";

/// Every file and directory the launcher touches, derived from one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Services selection written by the UI configurator
    pub fn services_config(&self) -> PathBuf {
        self.shared_dir().join("custom_services.json")
    }

    pub fn shared_dir(&self) -> PathBuf {
        self.root.join("shared")
    }

    /// Application stack definition
    pub fn compose_file(&self) -> PathBuf {
        self.root.join("docker-compose.yml")
    }

    /// Override applied to the application stack for the given environment
    pub fn environment_override(&self, environment: Environment) -> PathBuf {
        self.root
            .join(format!("docker-compose.override.{}.yml", environment.as_str()))
    }

    /// Override applied to the backing-platform stack in the public environment
    pub fn platform_public_override(&self) -> PathBuf {
        self.root.join("docker-compose.override.public.supabase.yml")
    }

    pub fn platform_dir(&self) -> PathBuf {
        self.root.join(PLATFORM_DIR)
    }

    pub fn platform_compose_file(&self) -> PathBuf {
        self.platform_dir().join("docker").join("docker-compose.yml")
    }

    /// Where the backing platform expects its environment file
    pub fn platform_env_file(&self) -> PathBuf {
        self.platform_dir().join("docker").join(".env")
    }

    /// Env file written by the UI configurator; preferred over the root one
    pub fn shared_env_file(&self) -> PathBuf {
        self.shared_dir().join(".env")
    }

    pub fn root_env_file(&self) -> PathBuf {
        self.root.join(".env")
    }

    pub fn env_example_file(&self) -> PathBuf {
        self.root.join(".env.example")
    }

    pub fn search_settings(&self) -> PathBuf {
        self.root.join("searxng").join("settings.yml")
    }

    pub fn search_settings_base(&self) -> PathBuf {
        self.root.join("searxng").join("settings-base.yml")
    }

    /// Host directories removed by a clean install, with a human description
    pub fn cleanup_directories(&self) -> Vec<(PathBuf, &'static str)> {
        vec![
            (self.platform_dir(), "Supabase repository"),
            (self.root.join("neo4j"), "Neo4j database and logs"),
            (self.shared_dir(), "Shared files and configuration"),
            (
                self.root.join("localai-ui").join("node_modules"),
                "LocalAI UI frontend dependencies",
            ),
            (
                self.root.join("localai-ui").join("backend").join("node_modules"),
                "LocalAI UI backend dependencies",
            ),
            (self.root.join("localai-ui").join("dist"), "LocalAI UI built assets"),
            (self.root.join("localai-ui").join("output"), "LocalAI UI output files"),
        ]
    }

    /// Generated files removed by a clean install
    pub fn cleanup_files(&self) -> Vec<(PathBuf, &'static str)> {
        vec![
            (self.search_settings(), "SearXNG generated settings"),
            (self.platform_env_file(), "Supabase environment file"),
        ]
    }

    /// Find the project root: the nearest ancestor holding a compose file.
    pub fn discover(start_dir: &Path) -> Option<Self> {
        let mut current = start_dir.to_path_buf();
        loop {
            if current.join("docker-compose.yml").exists() {
                return Some(Self::new(current));
            }

            if !current.pop() {
                return None;
            }
        }
    }
}
