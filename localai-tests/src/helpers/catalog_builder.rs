//! Programmatic services documents with builder pattern

use localai_core::config::{ServiceCatalog, ServiceConfig};
use std::path::{Path, PathBuf};

/// Builder for a `custom_services.json` document.
///
/// Categories and services keep insertion order in the written file, so
/// document-order behaviour can be tested.
#[derive(Default)]
pub struct TestCatalogBuilder {
    categories: Vec<(String, Vec<(String, ServiceConfig)>)>,
}

impl TestCatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_service(mut self, category: &str, id: &str, service: ServiceConfig) -> Self {
        match self.categories.iter_mut().find(|(name, _)| name == category) {
            Some((_, services)) => services.push((id.to_string(), service)),
            None => self
                .categories
                .push((category.to_string(), vec![(id.to_string(), service)])),
        }
        self
    }

    /// Render as JSON, preserving insertion order
    pub fn to_json(&self) -> String {
        let categories: Vec<String> = self
            .categories
            .iter()
            .map(|(category, services)| {
                let services: Vec<String> = services
                    .iter()
                    .map(|(id, config)| {
                        let config = serde_json::to_string(config)
                            .unwrap_or_else(|e| panic!("serialize {}: {}", id, e));
                        format!("{}: {}", serde_json::Value::from(id.as_str()), config)
                    })
                    .collect();
                format!(
                    "{}: {{{}}}",
                    serde_json::Value::from(category.as_str()),
                    services.join(", ")
                )
            })
            .collect();
        format!("{{\"services\": {{{}}}}}", categories.join(", "))
    }

    pub fn build(&self) -> ServiceCatalog {
        ServiceCatalog::parse(&self.to_json(), Path::new("custom_services.json"))
            .unwrap_or_else(|e| panic!("test catalog should parse: {}", e))
    }

    /// Write the document to `path`, creating parent directories
    pub fn write_to(&self, path: &Path) -> std::io::Result<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json())?;
        Ok(path.to_path_buf())
    }
}

/// Builder for one service entry
#[derive(Default)]
pub struct TestServiceBuilder {
    config: ServiceConfig,
}

impl TestServiceBuilder {
    pub fn enabled() -> Self {
        Self {
            config: ServiceConfig {
                enabled: true,
                ..Default::default()
            },
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: &str, variant: &str) -> Self {
        self.config
            .profiles
            .insert(profile.to_string(), variant.to_string());
        self
    }

    pub fn with_pull(mut self, profile: &str, companion: &str) -> Self {
        self.config
            .pull_services
            .insert(profile.to_string(), companion.to_string());
        self
    }

    pub fn with_dependencies(mut self, deps: &[&str]) -> Self {
        self.config.dependencies = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn external(mut self) -> Self {
        self.config.external_compose = true;
        self
    }

    pub fn build(self) -> ServiceConfig {
        self.config
    }
}

