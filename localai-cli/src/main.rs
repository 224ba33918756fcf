mod config;
mod errors;

use std::path::PathBuf;
use std::time::Duration;

use crate::{config::Config, errors::Result};
use clap::Parser;
use colored::Colorize;
use localai_core::cleanup::{CleanupOutcome, perform_cleanup};
use localai_core::config::{Environment, RunProfile, parse_duration};
use localai_core::layout::DEFAULT_PROJECT_NAME;
use localai_core::platform::GitSparseCheckout;
use localai_core::prompt::StdinConfirm;
use localai_core::runtime::DockerCli;
use localai_core::{Bootstrap, BootstrapReport, LaunchOptions};
use tracing_subscriber::EnvFilter;

/// Start the local AI platform and its backing services
#[derive(Parser, Debug)]
#[command(name = "localai")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Compose profile selecting hardware-specific service variants
    #[arg(long, value_enum, default_value_t = RunProfile::Cpu)]
    pub profile: RunProfile,

    /// Override set applied to the application stack
    #[arg(long, value_enum, default_value_t = Environment::Private)]
    pub environment: Environment,

    /// Remove all containers, volumes and generated files before starting
    #[arg(long)]
    pub clean: bool,

    /// Project directory (defaults to the nearest directory with a docker-compose.yml)
    #[arg(short = 'C', long = "project-dir")]
    pub project_dir: Option<PathBuf>,

    /// Compose project name shared by both stacks
    #[arg(short = 'p', long = "project-name", default_value = DEFAULT_PROJECT_NAME)]
    pub project_name: String,

    /// How long to wait for the backing platform before starting the application (e.g. 10s, 1m)
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub settle: Duration,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            profile: self.profile,
            environment: self.environment,
            project_name: self.project_name.clone(),
            settle: self.settle,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(false)
        .init();

    let layout = Config::resolve_project(cli.project_dir.as_deref())?;
    let runtime = DockerCli::new(layout.root());
    let confirm = StdinConfirm;

    if cli.clean {
        match perform_cleanup(&layout, &runtime, &confirm, &cli.project_name).await {
            CleanupOutcome::Cancelled => return Ok(()),
            CleanupOutcome::Completed { .. } => {
                println!(
                    "\n{}\n",
                    "Cleanup completed. Starting fresh installation...".green()
                );
            }
        }
    }

    let fetcher = GitSparseCheckout::default();
    let report = Bootstrap::new(&layout, cli.launch_options(), &runtime, &fetcher, &confirm)
        .run()
        .await?;
    print_summary(&report, &cli.project_name);
    Ok(())
}

fn print_summary(report: &BootstrapReport, project: &str) {
    println!("{} Project {} started", "✓".green().bold(), project.bold());
    match &report.services {
        Some(services) => {
            for service in services.iter() {
                println!("  {}", service);
            }
        }
        None => println!("  {}", "all services".dimmed()),
    }
    if report.posture == Some(localai_core::directive::PostureChange::Relaxed) {
        println!(
            "{}",
            "cap_drop is relaxed for the search service's first run; launch again once it has initialized"
                .yellow()
        );
    }
}
