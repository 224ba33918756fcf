//! Search service settings and its secret key.
//!
//! `searxng/settings.yml` is materialized from `searxng/settings-base.yml`
//! once, then every occurrence of [`SECRET_PLACEHOLDER`] is replaced with a
//! fresh 256-bit key. Nothing here is fatal: the search service can still be
//! started with a placeholder secret, so failures are logged and reported.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::{LaunchError, Result};
use crate::layout::ProjectLayout;

/// Value shipped in the base settings that must never reach a running instance
pub const SECRET_PLACEHOLDER: &str = "ultrasecretkey";

/// 256-bit secret for the search service.
///
/// Generated via the OS CSPRNG and written as 64 lowercase hex characters.
#[derive(Clone, Copy)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).map_err(LaunchError::SecretGeneration)?;
        Ok(SecretKey(bytes))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        SecretKey(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([redacted])")
    }
}

/// How the settings file came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsOrigin {
    /// Copied from the base template during this run
    Created,
    AlreadyPresent,
}

/// Result of the search preparation stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretOutcome {
    /// The base template is missing, so nothing was touched
    TemplateMissing,
    /// Settings are in place; `replaced` placeholder occurrences were substituted
    Provisioned { origin: SettingsOrigin, replaced: usize },
    /// A step failed and was logged; the settings file may still hold the placeholder
    Failed(String),
}

/// Replace every placeholder occurrence in `content` with `key`.
///
/// Returns the new content and the number of occurrences replaced.
pub fn splice_secret(content: &str, key: &str) -> (String, usize) {
    let count = content.matches(SECRET_PLACEHOLDER).count();
    if count == 0 {
        return (content.to_string(), 0);
    }
    (content.replace(SECRET_PLACEHOLDER, key), count)
}

/// Copy the base template to the settings path unless settings already exist.
pub fn materialize_settings(base: &Path, settings: &Path) -> Result<SettingsOrigin> {
    if settings.exists() {
        return Ok(SettingsOrigin::AlreadyPresent);
    }
    std::fs::copy(base, settings).map_err(|e| LaunchError::file(settings, e))?;
    Ok(SettingsOrigin::Created)
}

fn substitute_in_file(settings: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(settings).map_err(|e| LaunchError::file(settings, e))?;
    if !content.contains(SECRET_PLACEHOLDER) {
        return Ok(0);
    }

    let key = SecretKey::generate()?;
    let (patched, replaced) = splice_secret(&content, &key.to_hex());
    std::fs::write(settings, patched).map_err(|e| LaunchError::file(settings, e))?;
    Ok(replaced)
}

/// Materialize the search settings and provision their secret key.
pub fn provision_search_secret(layout: &ProjectLayout) -> SecretOutcome {
    let base = layout.search_settings_base();
    let settings = layout.search_settings();

    if !base.exists() {
        warn!(
            "Search settings template {} not found, skipping secret generation",
            base.display()
        );
        return SecretOutcome::TemplateMissing;
    }

    let origin = match materialize_settings(&base, &settings) {
        Ok(origin) => origin,
        Err(e) => {
            warn!("Failed to create search settings: {}", e);
            return SecretOutcome::Failed(e.to_string());
        }
    };
    if origin == SettingsOrigin::Created {
        info!("Created {} from {}", settings.display(), base.display());
    }

    match substitute_in_file(&settings) {
        Ok(replaced) => {
            if replaced > 0 {
                info!("Generated search secret key ({} placeholder(s) replaced)", replaced);
            }
            SecretOutcome::Provisioned { origin, replaced }
        }
        Err(e) => {
            warn!("Failed to provision search secret key: {}", e);
            SecretOutcome::Failed(e.to_string())
        }
    }
}
