//! Per-service configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Selects which concrete variant of each service is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunProfile {
    #[default]
    Cpu,
    GpuNvidia,
    GpuAmd,
    /// No compose profile; only services without a profile are eligible
    None,
}

impl RunProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunProfile::Cpu => "cpu",
            RunProfile::GpuNvidia => "gpu-nvidia",
            RunProfile::GpuAmd => "gpu-amd",
            RunProfile::None => "none",
        }
    }

    /// Value for `docker compose --profile`, if any
    pub fn compose_profile(&self) -> Option<&'static str> {
        match self {
            RunProfile::None => None,
            other => Some(other.as_str()),
        }
    }
}

impl fmt::Display for RunProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public or private deployment; selects the compose override files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Private,
    Public,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Private => "private",
            Environment::Public => "public",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical, independently toggleable service.
///
/// Example:
/// ```yaml
/// ollama:
///   enabled: true
///   profiles:
///     cpu: ollama-cpu
///     gpu-nvidia: ollama-gpu
///   pull_services:
///     cpu: ollama-pull-llama-cpu
///   dependencies: [postgres]
/// ```
///
/// Fields the configurator writes for display purposes (names, descriptions)
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Concrete compose service to start per run profile
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, String>,
    /// Companion service that pulls images/models for the profile variant
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pull_services: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Orchestrated by a separate compose definition; never started or
    /// traversed as a dependency by the application stack
    #[serde(default)]
    pub external_compose: bool,
}

impl ServiceConfig {
    /// The concrete id to start for `profile`, if this service has a variant for it
    pub fn variant_for(&self, profile: RunProfile) -> Option<&str> {
        self.profiles.get(profile.as_str()).map(String::as_str)
    }

    /// The pull companion for `profile`, if any
    pub fn pull_companion_for(&self, profile: RunProfile) -> Option<&str> {
        self.pull_services.get(profile.as_str()).map(String::as_str)
    }
}
