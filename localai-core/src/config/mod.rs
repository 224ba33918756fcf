//! Services configuration for the launcher
//!
//! This module provides:
//! - `ServiceCatalog` - every declared service, in document order, keyed by a globally unique id
//! - `ServiceConfig` - per-service enablement, profile variants and dependencies
//! - `RunProfile` / `Environment` - the run-wide selectors
//!
//! The document is the `custom_services.json` written by the UI configurator:
//!
//! ```json
//! { "services": { "<category>": { "<service-id>": { "enabled": true } } } }
//! ```
//!
//! JSON is parsed with the YAML parser, so hand-written YAML works too.

mod duration;
mod service;

pub use duration::{format_duration, parse_duration};
pub use service::{Environment, RunProfile, ServiceConfig};

use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{LaunchError, Result};

/// A declared service together with the category it was listed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: String,
    pub id: String,
    pub config: ServiceConfig,
}

/// Every service from the configuration document.
///
/// Entries keep document order (categories, then services within each
/// category) so resolved start lists are reproducible. Ids are unique across
/// all categories; construction rejects duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl ServiceCatalog {
    /// Maximum config file size (10MB) to prevent OOM from accidentally large files
    const MAX_CONFIG_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Build a catalog from entries in order, enforcing global id uniqueness.
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self> {
        let mut catalog = ServiceCatalog::default();
        for entry in entries {
            if let Some(&existing) = catalog.index.get(&entry.id) {
                return Err(LaunchError::DuplicateService {
                    service: entry.id,
                    first: catalog.entries[existing].category.clone(),
                    second: entry.category,
                });
            }
            catalog.index.insert(entry.id.clone(), catalog.entries.len());
            catalog.entries.push(entry);
        }
        Ok(catalog)
    }

    /// Load the services document.
    ///
    /// A missing file is not an error: `Ok(None)` means no configuration
    /// narrows the run, so everything starts.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No custom services configuration found at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(LaunchError::file(path, e)),
        };
        if metadata.len() > Self::MAX_CONFIG_FILE_SIZE {
            return Err(LaunchError::Config(format!(
                "Services config '{}' is too large ({} bytes, max {} bytes)",
                path.display(),
                metadata.len(),
                Self::MAX_CONFIG_FILE_SIZE,
            )));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| LaunchError::file(path, e))?;
        let catalog = Self::parse(&contents, path)?;
        info!(
            "Loaded custom services configuration from {} ({} services)",
            path.display(),
            catalog.len()
        );
        Ok(Some(catalog))
    }

    /// Parse a services document. `path` is only used in error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(ServiceCatalog::default());
        }

        let de = serde_yaml::Deserializer::from_str(contents);
        let mut root: Value =
            serde_path_to_error::deserialize(de).map_err(|source| LaunchError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        if root.is_null() {
            return Ok(ServiceCatalog::default());
        }

        let root_map = root.as_mapping_mut().ok_or_else(|| {
            LaunchError::Config(format!("Services config '{}' must be a mapping", path.display()))
        })?;

        let services = match root_map.remove(Value::String("services".into())) {
            Some(Value::Null) | None => Value::Mapping(Mapping::new()),
            Some(value) => value,
        };

        for key in root_map.keys() {
            if let Some(key) = key.as_str() {
                debug!("Ignoring root-level field `{}` in {}", key, path.display());
            }
        }

        let categories = as_mapping(&services, "services", path)?;
        let mut entries = Vec::new();
        for (category_key, category_value) in categories {
            let category = key_str(category_key, "services", path)?;
            if category_value.is_null() {
                continue;
            }
            let services = as_mapping(category_value, &format!("services.{}", category), path)?;

            for (service_key, service_value) in services {
                let id = key_str(service_key, &format!("services.{}", category), path)?;
                let config: ServiceConfig = serde_path_to_error::deserialize(service_value.clone())
                    .map_err(|e| {
                        locate_field_error(contents, path).unwrap_or_else(|| {
                            LaunchError::Config(format!(
                                "Failed to parse services config '{}': services.{}.{}: {}",
                                path.display(),
                                category,
                                id,
                                e
                            ))
                        })
                    })?;

                entries.push(CatalogEntry {
                    category: category.to_string(),
                    id: id.to_string(),
                    config,
                });
            }
        }

        Self::from_entries(entries)
    }

    /// Look up a service by id
    pub fn get(&self, id: &str) -> Option<&ServiceConfig> {
        self.entry(id).map(|e| &e.config)
    }

    fn entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// True if the service is declared and enabled
    pub fn is_enabled(&self, id: &str) -> bool {
        self.get(id).is_some_and(|c| c.enabled)
    }

    /// True if the service is declared as orchestrated by a separate compose file
    pub fn is_external(&self, id: &str) -> bool {
        self.get(id).is_some_and(|c| c.external_compose)
    }

    /// Entries in document order
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Category names in document order, without repeats
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.category.as_str()) {
                seen.push(&entry.category);
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn as_mapping<'a>(value: &'a Value, field: &str, path: &Path) -> Result<&'a Mapping> {
    value.as_mapping().ok_or_else(|| {
        LaunchError::Config(format!(
            "Services config '{}': '{}' must be a mapping",
            path.display(),
            field
        ))
    })
}

fn key_str<'a>(key: &'a Value, field: &str, path: &Path) -> Result<&'a str> {
    key.as_str().ok_or_else(|| {
        LaunchError::Config(format!(
            "Services config '{}': keys under '{}' must be strings",
            path.display(),
            field
        ))
    })
}

#[cfg(test)]
mod tests;

/// Typed shape of the whole document. Deserializing the source text through it
/// yields field errors with their line and column.
#[derive(serde::Deserialize)]
#[allow(dead_code)]
struct TypedDocument {
    #[serde(default)]
    services: Option<HashMap<String, Option<HashMap<String, ServiceConfig>>>>,
}

fn locate_field_error(contents: &str, path: &Path) -> Option<LaunchError> {
    let de = serde_yaml::Deserializer::from_str(contents);
    serde_path_to_error::deserialize::<_, TypedDocument>(de)
        .err()
        .map(|source| LaunchError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
}
