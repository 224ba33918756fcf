//! Has the search service ever initialized on this host?

use tracing::{info, warn};

use crate::runtime::ContainerRuntime;

/// Container name filter for the search service
pub const SEARCH_CONTAINER_FILTER: &str = "searxng";

/// File the search container writes once its first start completes
pub const INITIALIZED_MARKER: &str = "/etc/searxng/uwsgi.ini";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstRunReason {
    /// No running search container
    NoInstance,
    /// A container is running but has not written its marker yet
    MarkerAbsent { container: String },
    /// The runtime could not be queried
    ProbeFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstRunState {
    FirstRun(FirstRunReason),
    Initialized { container: String },
}

impl FirstRunState {
    pub fn is_first_run(&self) -> bool {
        matches!(self, FirstRunState::FirstRun(_))
    }
}

/// Probe the runtime and classify the search service.
///
/// Anything short of a positive marker check counts as a first run.
pub async fn classify<R: ContainerRuntime>(runtime: &R) -> FirstRunState {
    let containers = match runtime.running_containers(SEARCH_CONTAINER_FILTER).await {
        Ok(containers) => containers,
        Err(e) => {
            warn!("Could not list search containers: {}, assuming first run", e);
            return FirstRunState::FirstRun(FirstRunReason::ProbeFailed(e.to_string()));
        }
    };

    let Some(container) = containers.into_iter().next() else {
        info!("No running search container, assuming first run");
        return FirstRunState::FirstRun(FirstRunReason::NoInstance);
    };
    info!("Found running search container: {}", container);

    match runtime.container_has_file(&container, INITIALIZED_MARKER).await {
        Ok(true) => {
            info!("{} present in {}, search service is initialized", INITIALIZED_MARKER, container);
            FirstRunState::Initialized { container }
        }
        Ok(false) => {
            info!("{} not found in {}, first run", INITIALIZED_MARKER, container);
            FirstRunState::FirstRun(FirstRunReason::MarkerAbsent { container })
        }
        Err(e) => {
            warn!("Could not probe {}: {}, assuming first run", container, e);
            FirstRunState::FirstRun(FirstRunReason::ProbeFailed(e.to_string()))
        }
    }
}
