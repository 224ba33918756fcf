use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, warn};

use crate::config::ServiceCatalog;

/// Concrete service ids to hand to `docker compose up`.
///
/// Membership is all that matters; iteration is sorted so the same set always
/// renders the same command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedServiceSet(BTreeSet<String>);

impl ResolvedServiceSet {
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ResolvedServiceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ResolvedServiceSet(iter.into_iter().map(Into::into).collect())
    }
}

/// Close `seed` over the catalog's `dependencies` edges.
///
/// Uses a worklist and a visited set, so re-entering a member is a no-op and
/// cyclic graphs terminate. Dependencies marked `external_compose` are never
/// added; external seeds are dropped. Dependencies the catalog does not declare
/// are still added since the compose file may define them.
///
/// With no catalog or an empty seed the seed is returned as-is.
pub fn close_over_dependencies(
    catalog: Option<&ServiceCatalog>,
    seed: &[String],
) -> ResolvedServiceSet {
    let Some(catalog) = catalog else {
        return seed.iter().cloned().collect();
    };
    if seed.is_empty() {
        return ResolvedServiceSet::default();
    }

    let mut resolved: BTreeSet<String> = BTreeSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();

    for id in seed {
        if catalog.is_external(id) {
            warn!("Not starting {}: it is orchestrated by a separate compose file", id);
            continue;
        }
        if resolved.insert(id.clone()) {
            queue.push_back(id.clone());
        }
    }

    while let Some(id) = queue.pop_front() {
        // Profile variants (e.g. ollama-cpu) have no entry of their own
        let Some(config) = catalog.get(&id) else {
            continue;
        };

        for dep in &config.dependencies {
            if resolved.contains(dep) {
                continue;
            }
            if catalog.is_external(dep) {
                debug!("{}: skipping externally orchestrated dependency {}", id, dep);
                continue;
            }
            if catalog.get(dep).is_none() {
                debug!("{}: dependency {} is not declared in the catalog", id, dep);
            }

            debug!("{}: pulling in dependency {}", id, dep);
            resolved.insert(dep.clone());
            queue.push_back(dep.clone());
        }
    }

    ResolvedServiceSet(resolved)
}
