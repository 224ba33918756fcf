//! Run-wide switches for the optional stacks.

use crate::config::ServiceCatalog;

/// Backing platform service; listed under the `databases` category
pub const BACKING_PLATFORM_SERVICE: &str = "supabase";

/// Search service; listed under the `utilities` category
pub const SEARCH_SERVICE: &str = "searxng";

/// Whether the backing platform and the search service take part in this run.
///
/// Computed once after the catalog loads. Later stages (compose file
/// selection, the settle wait) rely on it staying fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackGate {
    pub start_backing_platform: bool,
    pub start_search: bool,
}

impl StackGate {
    /// Without a catalog both are on. With one, each gate is the enabled flag
    /// of its service; ids are globally unique so the lookup ignores category.
    pub fn from_catalog(catalog: Option<&ServiceCatalog>) -> Self {
        match catalog {
            None => StackGate {
                start_backing_platform: true,
                start_search: true,
            },
            Some(catalog) => StackGate {
                start_backing_platform: catalog.is_enabled(BACKING_PLATFORM_SERVICE),
                start_search: catalog.is_enabled(SEARCH_SERVICE),
            },
        }
    }
}
