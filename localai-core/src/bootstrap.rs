//! The launch sequence.
//!
//! Stages run strictly in order, each awaiting its external processes before
//! the next begins:
//!
//! 1. load the catalog and fix the [`StackGate`] for the run
//! 2. prepare the backing platform checkout and env file (gated)
//! 3. materialize search settings and their secret (gated)
//! 4. classify the search first run and adjust `cap_drop` (gated)
//! 5. tear down the previous deployment
//! 6. start the backing platform, then wait for it to settle (gated)
//! 7. resolve and start the application services
//!
//! Stages 2, 5, 6 and 7 abort the run on failure, with no rollback. The
//! others log a warning and carry on.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::config::{Environment, RunProfile, ServiceCatalog, format_duration};
use crate::deps::{ResolvedServiceSet, close_over_dependencies};
use crate::directive::{PostureChange, SecurityPosture, apply_posture};
use crate::errors::Result;
use crate::first_run::{FirstRunState, classify};
use crate::gate::StackGate;
use crate::layout::{DEFAULT_PROJECT_NAME, ProjectLayout};
use crate::platform::{EnvPropagation, SourceFetcher, SourceState, ensure_platform_source, propagate_env};
use crate::prompt::Confirm;
use crate::resolve::{ServiceSelection, enabled_services};
use crate::runtime::{ComposeAction, ComposeInvocation, ContainerRuntime};
use crate::secret::{SecretOutcome, provision_search_secret};

/// Time given to the backing platform to come up before the application stack
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(10);

/// Per-run launch settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub profile: RunProfile,
    pub environment: Environment,
    pub project_name: String,
    pub settle: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            profile: RunProfile::default(),
            environment: Environment::default(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            settle: DEFAULT_SETTLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    ConfigLoaded,
    PlatformPrepared,
    SearchPrepared,
    FirstRunClassified,
    Torndown,
    PlatformStarted,
    ApplicationStarted,
}

/// What a completed run did.
///
/// Fields of gated stages are `None` when the stage was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Completed stages, in order
    pub stages: Vec<Stage>,
    pub gate: StackGate,
    pub platform_source: Option<SourceState>,
    pub env: Option<EnvPropagation>,
    pub secret: Option<SecretOutcome>,
    pub first_run: Option<FirstRunState>,
    pub posture: Option<PostureChange>,
    pub selection: ServiceSelection,
    /// Services passed to the final `up`; `None` when everything was started
    pub services: Option<ResolvedServiceSet>,
}

impl BootstrapReport {
    fn new(gate: StackGate) -> Self {
        Self {
            stages: vec![Stage::ConfigLoaded],
            gate,
            platform_source: None,
            env: None,
            secret: None,
            first_run: None,
            posture: None,
            selection: ServiceSelection::All,
            services: None,
        }
    }
}

pub struct Bootstrap<'a, R, F, C> {
    layout: &'a ProjectLayout,
    options: LaunchOptions,
    runtime: &'a R,
    fetcher: &'a F,
    confirm: &'a C,
}

impl<'a, R, F, C> Bootstrap<'a, R, F, C>
where
    R: ContainerRuntime,
    F: SourceFetcher,
    C: Confirm,
{
    pub fn new(
        layout: &'a ProjectLayout,
        options: LaunchOptions,
        runtime: &'a R,
        fetcher: &'a F,
        confirm: &'a C,
    ) -> Self {
        Self {
            layout,
            options,
            runtime,
            fetcher,
            confirm,
        }
    }

    pub async fn run(&self) -> Result<BootstrapReport> {
        let catalog = ServiceCatalog::load(&self.layout.services_config())?;
        let gate = StackGate::from_catalog(catalog.as_ref());
        info!(
            "Backing platform {}, search {}",
            if gate.start_backing_platform { "enabled" } else { "disabled" },
            if gate.start_search { "enabled" } else { "disabled" },
        );
        let mut report = BootstrapReport::new(gate);

        if gate.start_backing_platform {
            report.platform_source =
                Some(ensure_platform_source(self.fetcher, &self.layout.platform_dir()).await?);
            report.env = Some(propagate_env(self.layout, self.confirm)?);
            report.stages.push(Stage::PlatformPrepared);
        }

        if gate.start_search {
            report.secret = Some(provision_search_secret(self.layout));
            report.stages.push(Stage::SearchPrepared);

            let state = classify(self.runtime).await;
            let posture = SecurityPosture::for_state(&state);
            report.posture = Some(apply_posture(&self.layout.compose_file(), posture));
            report.first_run = Some(state);
            report.stages.push(Stage::FirstRunClassified);
        }

        info!(
            "Stopping existing containers for project '{}'",
            self.options.project_name
        );
        self.runtime.compose(&self.teardown_invocation(gate)).await?;
        report.stages.push(Stage::Torndown);

        if gate.start_backing_platform {
            info!("Starting backing platform");
            self.runtime.compose(&self.platform_invocation()).await?;
            info!(
                "Waiting {} for the backing platform to initialize",
                format_duration(&self.options.settle)
            );
            tokio::time::sleep(self.options.settle).await;
            report.stages.push(Stage::PlatformStarted);
        }

        let selection = enabled_services(catalog.as_ref(), self.options.profile);
        let services = if selection.starts_everything() {
            None
        } else {
            let resolved = close_over_dependencies(catalog.as_ref(), selection.ids());
            (!resolved.is_empty()).then_some(resolved)
        };

        match &services {
            Some(services) => info!(
                "Starting selected services: {}",
                services.iter().collect::<Vec<_>>().join(", ")
            ),
            None => info!("Starting all services"),
        }
        let names = services.as_ref().map(ResolvedServiceSet::to_vec).unwrap_or_default();
        self.runtime
            .compose(&self.application_invocation(gate, names))
            .await?;

        report.selection = selection;
        report.services = services;
        report.stages.push(Stage::ApplicationStarted);
        Ok(report)
    }

    /// Compose files are passed relative to the project root, where the
    /// runtime is invoked.
    fn relative(&self, path: PathBuf) -> PathBuf {
        if let Ok(relative) = path.strip_prefix(self.layout.root()) {
            return relative.to_path_buf();
        }
        path
    }

    fn platform_file_included(&self, gate: StackGate) -> Option<PathBuf> {
        let file = self.layout.platform_compose_file();
        (gate.start_backing_platform && file.is_file()).then(|| self.relative(file))
    }

    fn profile(&self) -> Option<&'static str> {
        self.options.profile.compose_profile()
    }

    pub fn teardown_invocation(&self, gate: StackGate) -> ComposeInvocation {
        let mut invocation = ComposeInvocation::new(&self.options.project_name, ComposeAction::down())
            .with_profile(self.profile())
            .with_file(self.relative(self.layout.compose_file()));
        if let Some(platform) = self.platform_file_included(gate) {
            invocation = invocation.with_file(platform);
        }
        invocation
    }

    pub fn platform_invocation(&self) -> ComposeInvocation {
        let mut invocation = ComposeInvocation::new(&self.options.project_name, ComposeAction::up())
            .with_file(self.relative(self.layout.platform_compose_file()));
        if self.options.environment == Environment::Public {
            invocation = invocation.with_file(self.relative(self.layout.platform_public_override()));
        }
        invocation
    }

    pub fn application_invocation(&self, gate: StackGate, services: Vec<String>) -> ComposeInvocation {
        let mut invocation = ComposeInvocation::new(&self.options.project_name, ComposeAction::up())
            .with_profile(self.profile())
            .with_file(self.relative(self.layout.compose_file()));
        if let Some(platform) = self.platform_file_included(gate) {
            invocation = invocation.with_file(platform);
        }
        invocation
            .with_file(self.relative(
                self.layout.environment_override(self.options.environment),
            ))
            .with_services(services)
    }
}

