//! Clean install: remove every container, volume, network and generated file
//! of the project before launching.
//!
//! The plan is gathered and shown first, and nothing is touched unless the
//! operator confirms. Once confirmed, individual failures are logged and the
//! cleanup carries on.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::{info, warn};

use crate::env::{EnvDrift, EnvFile, append_missing};
use crate::layout::ProjectLayout;
use crate::prompt::Confirm;
use crate::runtime::{ComposeAction, ComposeInvocation, ContainerRuntime};

/// A host path scheduled for removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPath {
    pub path: PathBuf,
    pub description: &'static str,
    /// Total size in bytes, or `None` when the path does not exist
    pub size_bytes: Option<u64>,
}

impl PlannedPath {
    fn inspect(path: PathBuf, description: &'static str) -> Self {
        let size_bytes = match std::fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => Some(directory_size(&path)),
            Ok(meta) => Some(meta.len()),
            Err(_) => None,
        };
        Self {
            path,
            description,
            size_bytes,
        }
    }

    pub fn exists(&self) -> bool {
        self.size_bytes.is_some()
    }
}

/// Everything a clean install would remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPlan {
    pub project: String,
    pub volumes: Vec<String>,
    pub networks: Vec<String>,
    pub directories: Vec<PlannedPath>,
    pub files: Vec<PlannedPath>,
}

/// Sum of file sizes under `path`. Unreadable entries count as zero and
/// symlinks are not followed.
pub fn directory_size(path: &Path) -> u64 {
    let Ok(entries) = std::fs::read_dir(path) else {
        return 0;
    };

    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(ft) if ft.is_dir() => directory_size(&entry.path()),
            Ok(ft) if ft.is_file() => entry.metadata().map(|m| m.len()).unwrap_or(0),
            _ => 0,
        })
        .sum()
}

fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Volumes belonging to the project: those whose name contains it
async fn project_volumes<R: ContainerRuntime>(runtime: &R, project: &str) -> Vec<String> {
    match runtime.volumes().await {
        Ok(volumes) => volumes.into_iter().filter(|v| v.contains(project)).collect(),
        Err(e) => {
            warn!("Could not list volumes: {}", e);
            Vec::new()
        }
    }
}

async fn project_networks<R: ContainerRuntime>(runtime: &R, project: &str) -> Vec<String> {
    match runtime.networks(project).await {
        Ok(networks) => networks,
        Err(e) => {
            warn!("Could not list networks: {}", e);
            Vec::new()
        }
    }
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "PATH")]
    path: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "SIZE")]
    size: String,
}

impl CleanupPlan {
    pub async fn gather<R: ContainerRuntime>(layout: &ProjectLayout, runtime: &R, project: &str) -> Self {
        let inspect_all = |paths: Vec<(PathBuf, &'static str)>| -> Vec<PlannedPath> {
            paths
                .into_iter()
                .map(|(path, description)| PlannedPath::inspect(path, description))
                .collect()
        };

        Self {
            project: project.to_string(),
            volumes: project_volumes(runtime, project).await,
            networks: project_networks(runtime, project).await,
            directories: inspect_all(layout.cleanup_directories()),
            files: inspect_all(layout.cleanup_files()),
        }
    }

    fn rows(&self, paths: &[PlannedPath], root: &Path, with_size: bool) -> Vec<PlanRow> {
        paths
            .iter()
            .map(|p| PlanRow {
                path: p
                    .path
                    .strip_prefix(root)
                    .unwrap_or(p.path.as_path())
                    .display()
                    .to_string(),
                description: p.description.to_string(),
                size: match p.size_bytes {
                    None => "not found".dimmed().to_string(),
                    Some(bytes) if with_size => format_megabytes(bytes),
                    Some(_) => "present".to_string(),
                },
            })
            .collect()
    }

    /// Human-readable listing of the plan
    pub fn render(&self, root: &Path) -> String {
        let mut out = String::new();

        out.push_str(&format!("{}\n", "Docker resources:".bold()));
        out.push_str(&format!("  all containers for project '{}'\n", self.project));
        if self.volumes.is_empty() {
            out.push_str("  volumes (if any exist)\n");
        } else {
            out.push_str(&format!(
                "  {} volumes ({})\n",
                self.volumes.len(),
                self.volumes.join(", ")
            ));
        }
        out.push_str(&format!("  networks for project '{}'\n\n", self.project));

        let mut directories = Table::new(self.rows(&self.directories, root, true));
        directories.with(Style::rounded());
        out.push_str(&format!("{}\n{}\n\n", "Host directories:".bold(), directories));

        let mut files = Table::new(self.rows(&self.files, root, false));
        files.with(Style::rounded());
        out.push_str(&format!("{}\n{}\n", "Configuration files:".bold(), files));

        out
    }
}

/// What happened to the root `.env` after cleanup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileAction {
    Absent,
    Deleted,
    Kept {
        /// `None` when the file or its example could not be read
        drift: Option<EnvDrift>,
        appended: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupSummary {
    pub removed_volumes: usize,
    pub removed_networks: usize,
    pub removed_directories: usize,
    pub removed_files: usize,
    /// Steps that failed and were skipped
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The operator declined; nothing was removed
    Cancelled,
    Completed {
        summary: CleanupSummary,
        env: EnvFileAction,
    },
}

/// Show the plan, confirm, then remove everything in it.
pub async fn perform_cleanup<R, C>(
    layout: &ProjectLayout,
    runtime: &R,
    confirm: &C,
    project: &str,
) -> CleanupOutcome
where
    R: ContainerRuntime,
    C: Confirm,
{
    let plan = CleanupPlan::gather(layout, runtime, project).await;

    println!(
        "{}\n",
        "WARNING: This will permanently delete ALL data from the local AI stack!"
            .red()
            .bold()
    );
    println!("The following will be PERMANENTLY DELETED:\n");
    println!("{}", plan.render(layout.root()));

    if !confirm.confirm("Are you ABSOLUTELY SURE you want to delete all this data?") {
        println!("Cleanup cancelled.");
        return CleanupOutcome::Cancelled;
    }

    let summary = execute(&plan, runtime).await;
    let env = reconcile_env_file(layout, confirm);
    info!(
        "Cleanup completed: {} volume(s), {} network(s), {} director(ies), {} file(s) removed, {} warning(s)",
        summary.removed_volumes,
        summary.removed_networks,
        summary.removed_directories,
        summary.removed_files,
        summary.warnings
    );
    CleanupOutcome::Completed { summary, env }
}

async fn execute<R: ContainerRuntime>(plan: &CleanupPlan, runtime: &R) -> CleanupSummary {
    let mut summary = CleanupSummary::default();

    info!("Stopping and removing containers");
    let down = ComposeInvocation::new(
        &plan.project,
        ComposeAction::Down {
            volumes: true,
            remove_orphans: true,
        },
    );
    if let Err(e) = runtime.compose(&down).await {
        warn!("Failed to stop project containers: {}", e);
        summary.warnings += 1;
    }

    // compose down already dropped the volumes it knew about
    info!("Removing volumes");
    for volume in project_volumes(runtime, &plan.project).await {
        match runtime.remove_volume(&volume).await {
            Ok(()) => summary.removed_volumes += 1,
            Err(e) => {
                warn!("Failed to remove volume {}: {}", volume, e);
                summary.warnings += 1;
            }
        }
    }

    info!("Removing networks");
    for network in project_networks(runtime, &plan.project).await {
        match runtime.remove_network(&network).await {
            Ok(()) => summary.removed_networks += 1,
            Err(e) => {
                warn!("Failed to remove network {}: {}", network, e);
                summary.warnings += 1;
            }
        }
    }

    for dir in plan.directories.iter().filter(|d| d.path.exists()) {
        info!("Removing {}", dir.path.display());
        match std::fs::remove_dir_all(&dir.path) {
            Ok(()) => summary.removed_directories += 1,
            Err(e) => {
                warn!("Failed to remove {}: {}", dir.path.display(), e);
                summary.warnings += 1;
            }
        }
    }

    // a file may already be gone with its directory
    for file in plan.files.iter().filter(|f| f.path.exists()) {
        info!("Removing {}", file.path.display());
        match std::fs::remove_file(&file.path) {
            Ok(()) => summary.removed_files += 1,
            Err(e) => {
                warn!("Failed to remove {}: {}", file.path.display(), e);
                summary.warnings += 1;
            }
        }
    }

    summary
}

/// Offer to delete the root `.env`; if kept, check it against `.env.example`
/// and offer to append what is missing.
pub fn reconcile_env_file<C: Confirm>(layout: &ProjectLayout, confirm: &C) -> EnvFileAction {
    let env_path = layout.root_env_file();
    if !env_path.is_file() {
        println!("No .env file found.");
        return EnvFileAction::Absent;
    }

    if confirm.confirm("Do you also want to delete the .env file? This contains your passwords and secrets.") {
        match std::fs::remove_file(&env_path) {
            Ok(()) => {
                println!("Deleted .env file.");
                return EnvFileAction::Deleted;
            }
            Err(e) => warn!("Failed to delete {}: {}", env_path.display(), e),
        }
    }

    println!("Keeping .env file. Validating against .env.example...");
    let example_path = layout.env_example_file();
    let (current, example) = match (EnvFile::load(&env_path), EnvFile::load(&example_path)) {
        (Ok(current), Ok(example)) => (current, example),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Cannot validate .env: {}", e);
            return EnvFileAction::Kept {
                drift: None,
                appended: false,
            };
        }
    };

    let drift = EnvDrift::between(&current, &example);
    let mut appended = false;

    if drift.missing.is_empty() {
        println!("{} All required variables present", "✓".green());
    } else {
        println!("{} Missing variables in .env:", "!".yellow().bold());
        for key in &drift.missing {
            println!("   - {}", key);
        }
        if confirm.confirm("Would you like to add the missing variables to .env?") {
            match append_missing(&env_path, &drift.missing, &example) {
                Ok(()) => {
                    println!(
                        "{} Updated .env with missing variables (existing values preserved)",
                        "✓".green()
                    );
                    appended = true;
                }
                Err(e) => warn!("Failed to update .env: {}", e),
            }
        }
    }

    if !drift.extra.is_empty() {
        println!("Extra variables in .env (not in .env.example):");
        for key in &drift.extra {
            println!("   - {}", key);
        }
    }

    EnvFileAction::Kept {
        drift: Some(drift),
        appended,
    }
}
