//! Backing platform (Supabase) preparation: source checkout and env file.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::errors::{LaunchError, Result};
use crate::layout::ProjectLayout;
use crate::process::CommandSpec;
use crate::prompt::Confirm;

pub const PLATFORM_REPOSITORY: &str = "https://github.com/supabase/supabase.git";
pub const PLATFORM_SPARSE_PATH: &str = "docker";
pub const PLATFORM_BRANCH: &str = "master";

/// Produces and refreshes the backing platform checkout
#[allow(async_fn_in_trait)]
pub trait SourceFetcher {
    /// Create a fresh checkout at `dest`, which does not exist yet.
    async fn fetch(&self, dest: &Path) -> Result<()>;

    /// Bring an existing checkout at `dest` up to date.
    async fn update(&self, dest: &Path) -> Result<()>;
}

/// Blob-less sparse clone of only the compose directory
#[derive(Debug, Clone)]
pub struct GitSparseCheckout {
    pub repository: String,
    pub sparse_path: String,
    pub branch: String,
}

impl Default for GitSparseCheckout {
    fn default() -> Self {
        Self {
            repository: PLATFORM_REPOSITORY.to_string(),
            sparse_path: PLATFORM_SPARSE_PATH.to_string(),
            branch: PLATFORM_BRANCH.to_string(),
        }
    }
}

impl GitSparseCheckout {
    fn git(dir: &Path, args: &[&str]) -> CommandSpec {
        CommandSpec::new(std::iter::once("git").chain(args.iter().copied()), dir)
    }
}

impl SourceFetcher for GitSparseCheckout {
    async fn fetch(&self, dest: &Path) -> Result<()> {
        let name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| LaunchError::PlatformFetch {
                path: dest.to_path_buf(),
                message: "checkout path has no directory name".to_string(),
            })?;
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Self::git(
            &parent,
            &["clone", "--filter=blob:none", "--no-checkout", &self.repository, &name],
        )
        .run_checked()
        .await?;
        Self::git(dest, &["sparse-checkout", "init", "--cone"]).run_checked().await?;
        Self::git(dest, &["sparse-checkout", "set", &self.sparse_path])
            .run_checked()
            .await?;
        Self::git(dest, &["checkout", &self.branch]).run_checked().await
    }

    async fn update(&self, dest: &Path) -> Result<()> {
        Self::git(dest, &["status"]).run_checked().await?;
        Self::git(dest, &["pull"]).run_checked().await
    }
}

/// How the checkout was made ready
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Updated,
    Fetched,
    /// The update failed, so the stale checkout was removed and fetched again
    Refetched,
}

/// Make sure an up-to-date checkout exists at `dest`.
///
/// Update failures are recovered by a fresh fetch; a failed fetch or a
/// checkout that cannot be removed is fatal.
pub async fn ensure_platform_source<F: SourceFetcher>(fetcher: &F, dest: &Path) -> Result<SourceState> {
    let mut state = SourceState::Fetched;

    if dest.exists() {
        info!("Backing platform checkout exists at {}, updating", dest.display());
        match fetcher.update(dest).await {
            Ok(()) => return Ok(SourceState::Updated),
            Err(e) => {
                warn!("Updating {} failed: {}, removing and fetching again", dest.display(), e);
                std::fs::remove_dir_all(dest).map_err(|e| LaunchError::PlatformFetch {
                    path: dest.to_path_buf(),
                    message: format!("could not remove stale checkout: {}", e),
                })?;
                state = SourceState::Refetched;
            }
        }
    }

    info!("Fetching backing platform into {}", dest.display());
    fetcher.fetch(dest).await.map_err(|e| LaunchError::PlatformFetch {
        path: dest.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(state)
}

/// Outcome of env file propagation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvPropagation {
    Copied { from: PathBuf },
    /// The destination existed and the operator chose to keep it
    KeptExisting,
}

/// The env file the platform should use: `shared/.env` if present, else `.env`.
pub fn env_source(layout: &ProjectLayout) -> Result<PathBuf> {
    let shared = layout.shared_env_file();
    if shared.is_file() {
        info!("Using .env from {}", shared.display());
        return Ok(shared);
    }

    let root = layout.root_env_file();
    if root.is_file() {
        info!("Using .env from project root");
        return Ok(root);
    }

    Err(LaunchError::EnvSourceMissing { shared, root })
}

/// Copy the project env file to the platform's compose directory.
pub fn propagate_env<C: Confirm>(layout: &ProjectLayout, confirm: &C) -> Result<EnvPropagation> {
    let from = env_source(layout)?;
    let to = layout.platform_env_file();

    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LaunchError::file(parent, e))?;
    }

    if to.exists() {
        let question = format!("File {} already exists. Overwrite it?", to.display());
        if !confirm.confirm(&question) {
            info!("Keeping existing {}", to.display());
            return Ok(EnvPropagation::KeptExisting);
        }
    }

    info!("Copying {} to {}", from.display(), to.display());
    std::fs::copy(&from, &to).map_err(|source| LaunchError::EnvCopy {
        from: from.clone(),
        to: to.clone(),
        source,
    })?;
    Ok(EnvPropagation::Copied { from })
}
