//! Projection of the services catalog onto concrete compose service ids

use tracing::debug;

use crate::config::{RunProfile, ServiceCatalog};

/// The UI configurator runs outside the managed stack and is never started here
pub const CONFIGURATOR_SERVICE: &str = "localai-ui";

/// Which application services to bring up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSelection {
    /// No configuration narrows the run: start everything the compose file declares
    All,
    /// Start exactly these concrete ids (before dependency closure), in document order
    Only(Vec<String>),
}

impl ServiceSelection {
    /// True when the compose invocation should carry no explicit service list
    pub fn starts_everything(&self) -> bool {
        match self {
            ServiceSelection::All => true,
            ServiceSelection::Only(ids) => ids.is_empty(),
        }
    }

    pub fn ids(&self) -> &[String] {
        match self {
            ServiceSelection::All => &[],
            ServiceSelection::Only(ids) => ids,
        }
    }
}

/// Resolve the enabled services of `catalog` for `profile`.
///
/// Disabled, externally orchestrated and configurator entries are skipped. A
/// service with a variant for `profile` contributes the variant id followed by
/// its pull companion (if any); otherwise it contributes its own id.
pub fn enabled_services(catalog: Option<&ServiceCatalog>, profile: RunProfile) -> ServiceSelection {
    let Some(catalog) = catalog else {
        return ServiceSelection::All;
    };

    let mut ids = Vec::new();
    for entry in catalog.iter() {
        let config = &entry.config;
        if !config.enabled || config.external_compose || entry.id == CONFIGURATOR_SERVICE {
            continue;
        }

        match config.variant_for(profile) {
            Some(variant) => {
                debug!("{}: using {} variant {}", entry.id, profile, variant);
                ids.push(variant.to_string());
                if let Some(pull) = config.pull_companion_for(profile) {
                    ids.push(pull.to_string());
                }
            }
            None => ids.push(entry.id.clone()),
        }
    }

    ServiceSelection::Only(ids)
}
