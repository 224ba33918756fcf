//! Launch sequence tests against recorded runtime calls
//!
//! Time is paused so the settle wait after the backing platform starts is
//! virtual.

use localai_core::bootstrap::{Bootstrap, LaunchOptions, Stage};
use localai_core::config::{Environment, RunProfile};
use localai_core::directive::{DIRECTIVE, PostureChange, RELAXED_DIRECTIVE};
use localai_core::errors::LaunchError;
use localai_core::first_run::{FirstRunReason, FirstRunState, INITIALIZED_MARKER};
use localai_core::platform::{EnvPropagation, SourceState};
use localai_core::resolve::ServiceSelection;
use localai_core::secret::{SECRET_PLACEHOLDER, SecretOutcome, SettingsOrigin};
use localai_tests::{
    FakeFetcher, RecordingRuntime, ScriptedConfirm, TestCatalogBuilder, TestProject,
    TestServiceBuilder,
};
use std::time::Duration;
use tokio::time::Instant;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Application services only; neither optional stack
fn app_only_catalog() -> TestCatalogBuilder {
    TestCatalogBuilder::new()
        .add_service(
            "core",
            "n8n",
            TestServiceBuilder::enabled()
                .with_dependencies(&["postgres", "n8n-import"])
                .build(),
        )
        .add_service(
            "core",
            "ollama",
            TestServiceBuilder::enabled()
                .with_profile("cpu", "ollama-cpu")
                .with_profile("gpu-nvidia", "ollama-gpu")
                .with_pull("cpu", "ollama-pull-llama-cpu")
                .build(),
        )
        .add_service("core", "localai-ui", TestServiceBuilder::enabled().build())
        .add_service("databases", "postgres", TestServiceBuilder::disabled().build())
        .add_service(
            "databases",
            "supabase",
            TestServiceBuilder::disabled().external().build(),
        )
        .add_service("utilities", "searxng", TestServiceBuilder::disabled().build())
}

#[tokio::test(start_paused = true)]
async fn test_no_catalog_starts_everything() {
    let project = TestProject::new();
    let runtime = RecordingRuntime::new();
    let fetcher = FakeFetcher::new();
    let confirm = ScriptedConfirm::always(false);

    let start = Instant::now();
    let report = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &fetcher,
        &confirm,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(
        report.stages,
        vec![
            Stage::ConfigLoaded,
            Stage::PlatformPrepared,
            Stage::SearchPrepared,
            Stage::FirstRunClassified,
            Stage::Torndown,
            Stage::PlatformStarted,
            Stage::ApplicationStarted,
        ]
    );
    assert!(report.gate.start_backing_platform);
    assert!(report.gate.start_search);
    assert_eq!(report.selection, ServiceSelection::All);
    assert_eq!(report.services, None);
    assert!(start.elapsed() >= Duration::from_secs(10));

    assert_eq!(
        runtime.compose_args(),
        vec![
            args(&[
                "compose",
                "-p",
                "localai",
                "--profile",
                "cpu",
                "-f",
                "docker-compose.yml",
                "-f",
                "supabase/docker/docker-compose.yml",
                "down",
            ]),
            args(&[
                "compose",
                "-p",
                "localai",
                "-f",
                "supabase/docker/docker-compose.yml",
                "up",
                "-d",
            ]),
            args(&[
                "compose",
                "-p",
                "localai",
                "--profile",
                "cpu",
                "-f",
                "docker-compose.yml",
                "-f",
                "supabase/docker/docker-compose.yml",
                "-f",
                "docker-compose.override.private.yml",
                "up",
                "-d",
            ]),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_catalog_prepares_both_stacks() {
    let project = TestProject::new();
    let runtime = RecordingRuntime::new();
    let fetcher = FakeFetcher::new();
    let confirm = ScriptedConfirm::always(false);

    let report = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &fetcher,
        &confirm,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.platform_source, Some(SourceState::Fetched));
    assert_eq!(fetcher.calls(), vec!["fetch"]);
    assert_eq!(
        report.env,
        Some(EnvPropagation::Copied {
            from: project.layout().root_env_file()
        })
    );
    assert_eq!(project.read("supabase/docker/.env"), project.read(".env"));

    assert_eq!(
        report.secret,
        Some(SecretOutcome::Provisioned {
            origin: SettingsOrigin::Created,
            replaced: 1
        })
    );
    assert!(!project.read("searxng/settings.yml").contains(SECRET_PLACEHOLDER));

    assert_eq!(
        report.first_run,
        Some(FirstRunState::FirstRun(FirstRunReason::NoInstance))
    );
    assert_eq!(report.posture, Some(PostureChange::Relaxed));
    assert!(project.read("docker-compose.yml").contains(RELAXED_DIRECTIVE));
}

#[tokio::test(start_paused = true)]
async fn test_catalog_selects_and_closes_services() {
    let project = TestProject::new().with_catalog(&app_only_catalog());
    let compose_before = project.read("docker-compose.yml");
    let runtime = RecordingRuntime::new();
    let fetcher = FakeFetcher::new();
    let confirm = ScriptedConfirm::always(false);

    let start = Instant::now();
    let report = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &fetcher,
        &confirm,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(
        report.stages,
        vec![Stage::ConfigLoaded, Stage::Torndown, Stage::ApplicationStarted]
    );
    assert_eq!(
        report.selection,
        ServiceSelection::Only(args(&["n8n", "ollama-cpu", "ollama-pull-llama-cpu"]))
    );
    let services: Vec<&str> = report.services.as_ref().unwrap().iter().collect();
    assert_eq!(
        services,
        vec!["n8n", "n8n-import", "ollama-cpu", "ollama-pull-llama-cpu", "postgres"]
    );

    // nothing gated in: no fetch, no settle, compose file untouched
    assert!(fetcher.calls().is_empty());
    assert!(start.elapsed() < Duration::from_secs(10));
    assert_eq!(project.read("docker-compose.yml"), compose_before);
    assert!(!project.exists("searxng/settings.yml"));

    assert_eq!(
        runtime.compose_args(),
        vec![
            args(&[
                "compose",
                "-p",
                "localai",
                "--profile",
                "cpu",
                "-f",
                "docker-compose.yml",
                "down",
            ]),
            args(&[
                "compose",
                "-p",
                "localai",
                "--profile",
                "cpu",
                "-f",
                "docker-compose.yml",
                "-f",
                "docker-compose.override.private.yml",
                "up",
                "-d",
                "n8n",
                "n8n-import",
                "ollama-cpu",
                "ollama-pull-llama-cpu",
                "postgres",
            ]),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_gpu_profile_and_public_environment() {
    let project = TestProject::new().with_catalog(&app_only_catalog());
    let runtime = RecordingRuntime::new();
    let options = LaunchOptions {
        profile: RunProfile::GpuNvidia,
        environment: Environment::Public,
        project_name: "ai".to_string(),
        ..Default::default()
    };

    Bootstrap::new(
        project.layout(),
        options,
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(false),
    )
    .run()
    .await
    .unwrap();

    let up = runtime.compose_args().pop().unwrap();
    assert_eq!(
        up,
        args(&[
            "compose",
            "-p",
            "ai",
            "--profile",
            "gpu-nvidia",
            "-f",
            "docker-compose.yml",
            "-f",
            "docker-compose.override.public.yml",
            "up",
            "-d",
            "n8n",
            "n8n-import",
            "ollama-gpu",
            "postgres",
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_profile_none_passes_no_profile_flag() {
    let project = TestProject::new().with_catalog(&app_only_catalog());
    let runtime = RecordingRuntime::new();
    let options = LaunchOptions {
        profile: RunProfile::None,
        ..Default::default()
    };

    Bootstrap::new(
        project.layout(),
        options,
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(false),
    )
    .run()
    .await
    .unwrap();

    for call in runtime.compose_args() {
        assert!(!call.contains(&"--profile".to_string()), "{:?}", call);
    }
}

#[tokio::test(start_paused = true)]
async fn test_public_environment_adds_platform_override() {
    let project = TestProject::new();
    let runtime = RecordingRuntime::new();
    let options = LaunchOptions {
        environment: Environment::Public,
        ..Default::default()
    };

    Bootstrap::new(
        project.layout(),
        options,
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(false),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(
        runtime.compose_args()[1],
        args(&[
            "compose",
            "-p",
            "localai",
            "-f",
            "supabase/docker/docker-compose.yml",
            "-f",
            "docker-compose.override.public.supabase.yml",
            "up",
            "-d",
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_only_platform_enabled() {
    let catalog = TestCatalogBuilder::new()
        .add_service("database", "supabase", TestServiceBuilder::enabled().build())
        .add_service("utilities", "searxng", TestServiceBuilder::disabled().build());
    let project = TestProject::new().with_catalog(&catalog);
    let runtime = RecordingRuntime::new();

    let report = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(false),
    )
    .run()
    .await
    .unwrap();

    assert!(report.gate.start_backing_platform);
    assert!(!report.gate.start_search);
    assert_eq!(
        report.stages,
        vec![
            Stage::ConfigLoaded,
            Stage::PlatformPrepared,
            Stage::Torndown,
            Stage::PlatformStarted,
            Stage::ApplicationStarted,
        ]
    );
    assert_eq!(report.first_run, None);
    assert_eq!(report.posture, None);
}

#[tokio::test(start_paused = true)]
async fn test_initialized_search_restores_directive() {
    let project = TestProject::new();
    project.write(
        "docker-compose.yml",
        &TestProject::compose_content().replace(DIRECTIVE, RELAXED_DIRECTIVE),
    );
    let runtime =
        RecordingRuntime::new().with_container("localai-searxng-1", Some(INITIALIZED_MARKER));

    let report = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(false),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(
        report.first_run,
        Some(FirstRunState::Initialized {
            container: "localai-searxng-1".to_string()
        })
    );
    assert_eq!(report.posture, Some(PostureChange::Restored));
    assert_eq!(project.read("docker-compose.yml"), TestProject::compose_content());
}

#[tokio::test(start_paused = true)]
async fn test_existing_checkout_is_updated_and_env_overwrite_declined() {
    let project = TestProject::new();
    project.write("supabase/docker/docker-compose.yml", "services: {}\n");
    project.write("supabase/docker/.env", "KEEP=me\n");
    let fetcher = FakeFetcher::new();
    let confirm = ScriptedConfirm::new(&[false]);

    let report = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &RecordingRuntime::new(),
        &fetcher,
        &confirm,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(report.platform_source, Some(SourceState::Updated));
    assert_eq!(fetcher.calls(), vec!["update"]);
    assert_eq!(report.env, Some(EnvPropagation::KeptExisting));
    assert_eq!(project.read("supabase/docker/.env"), "KEEP=me\n");
    assert_eq!(confirm.questions().len(), 1);
    assert!(confirm.questions()[0].contains("already exists"));
    assert_eq!(report.stages.last(), Some(&Stage::ApplicationStarted));
}

#[tokio::test(start_paused = true)]
async fn test_missing_env_source_aborts_before_compose() {
    let project = TestProject::empty();
    project.write("docker-compose.yml", &TestProject::compose_content());
    let runtime = RecordingRuntime::new();

    let err = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(true),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, LaunchError::EnvSourceMissing { .. }));
    assert!(runtime.compose_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_is_fatal() {
    let project = TestProject::new();
    let runtime = RecordingRuntime::new();

    let err = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &FakeFetcher::failing_fetch(),
        &ScriptedConfirm::always(true),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, LaunchError::PlatformFetch { .. }));
    assert!(runtime.compose_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_failure_is_fatal() {
    let project = TestProject::new().with_catalog(&app_only_catalog());
    let runtime = RecordingRuntime::new().failing_down();

    let err = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(true),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, LaunchError::CommandFailed { .. }));
    assert_eq!(runtime.compose_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_platform_start_failure_stops_the_run() {
    let project = TestProject::new();
    let runtime = RecordingRuntime::new().failing_up();

    let err = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(true),
    )
    .run()
    .await
    .unwrap_err();

    assert!(err.to_string().contains("docker compose up"));
    // teardown, then the failed platform start; the application is never started
    assert_eq!(runtime.compose_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_catalog_is_fatal() {
    let project = TestProject::new();
    project.write("shared/custom_services.json", "{\"services\": [1, 2");
    let runtime = RecordingRuntime::new();

    let err = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &FakeFetcher::new(),
        &ScriptedConfirm::always(true),
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, LaunchError::ConfigParse { .. }));
    assert!(runtime.compose_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_launch_is_idempotent_on_disk() {
    let project = TestProject::new();
    let runtime = RecordingRuntime::new();
    let fetcher = FakeFetcher::new();
    let confirm = ScriptedConfirm::always(false);
    let bootstrap = Bootstrap::new(
        project.layout(),
        LaunchOptions::default(),
        &runtime,
        &fetcher,
        &confirm,
    );

    bootstrap.run().await.unwrap();
    let settings = project.read("searxng/settings.yml");
    let compose = project.read("docker-compose.yml");

    let second = bootstrap.run().await.unwrap();
    assert_eq!(second.platform_source, Some(SourceState::Updated));
    assert_eq!(second.env, Some(EnvPropagation::KeptExisting));
    assert_eq!(second.posture, Some(PostureChange::Untouched));
    assert_eq!(
        second.secret,
        Some(SecretOutcome::Provisioned {
            origin: SettingsOrigin::AlreadyPresent,
            replaced: 0
        })
    );
    assert_eq!(project.read("searxng/settings.yml"), settings);
    assert_eq!(project.read("docker-compose.yml"), compose);
}
