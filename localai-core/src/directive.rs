//! The `cap_drop` directive of the search service.
//!
//! On its first start the search container needs capabilities to write its
//! initial config, so the directive is commented out until the container has
//! initialized, then put back. The patch is a plain string transformation of
//! `docker-compose.yml`; every byte other than the directive is preserved.

use std::path::Path;

use tracing::{info, warn};

use crate::first_run::FirstRunState;

/// The directive as it appears when enforced
pub const DIRECTIVE: &str = "cap_drop: - ALL";

/// The directive as left in the file while relaxed
pub const RELAXED_DIRECTIVE: &str = "# cap_drop: - ALL  # Temporarily commented out for first run";

/// Desired state of the directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityPosture {
    Relaxed,
    Enforced,
}

impl SecurityPosture {
    pub fn for_state(state: &FirstRunState) -> Self {
        if state.is_first_run() {
            SecurityPosture::Relaxed
        } else {
            SecurityPosture::Enforced
        }
    }
}

/// What applying a posture did to the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostureChange {
    Untouched,
    Relaxed,
    Restored,
}

/// A planned rewrite of the compose file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosturePatch {
    pub change: PostureChange,
    /// New file content; equal to the input when `change` is `Untouched`
    pub content: String,
}

/// Byte offsets of directives that are in effect. A directive preceded by
/// `#` on its own line is a comment, which also covers the relaxed marker.
fn enforced_offsets(content: &str) -> Vec<usize> {
    content
        .match_indices(DIRECTIVE)
        .map(|(offset, _)| offset)
        .filter(|&offset| {
            let line_start = content[..offset].rfind('\n').map_or(0, |i| i + 1);
            !content[line_start..offset].contains('#')
        })
        .collect()
}

fn relax(content: &str) -> Option<String> {
    let offsets = enforced_offsets(content);
    if offsets.is_empty() {
        return None;
    }

    let mut patched = String::with_capacity(content.len() + offsets.len() * RELAXED_DIRECTIVE.len());
    let mut cursor = 0;
    for offset in offsets {
        patched.push_str(&content[cursor..offset]);
        patched.push_str(RELAXED_DIRECTIVE);
        cursor = offset + DIRECTIVE.len();
    }
    patched.push_str(&content[cursor..]);
    Some(patched)
}

fn restore(content: &str) -> Option<String> {
    content
        .contains(RELAXED_DIRECTIVE)
        .then(|| content.replace(RELAXED_DIRECTIVE, DIRECTIVE))
}

/// Plan the rewrite that brings `content` to `posture`.
pub fn plan(content: &str, posture: SecurityPosture) -> PosturePatch {
    let patched = match posture {
        SecurityPosture::Relaxed => relax(content).map(|c| (PostureChange::Relaxed, c)),
        SecurityPosture::Enforced => restore(content).map(|c| (PostureChange::Restored, c)),
    };

    match patched {
        Some((change, content)) => PosturePatch { change, content },
        None => PosturePatch {
            change: PostureChange::Untouched,
            content: content.to_string(),
        },
    }
}

/// Apply `posture` to the compose file at `path`.
///
/// A missing file or an I/O failure is logged and reported as `Untouched`.
pub fn apply_posture(path: &Path, posture: SecurityPosture) -> PostureChange {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Cannot read {} to adjust cap_drop: {}", path.display(), e);
            return PostureChange::Untouched;
        }
    };

    let patch = plan(&content, posture);
    if patch.change == PostureChange::Untouched {
        return PostureChange::Untouched;
    }

    if let Err(e) = std::fs::write(path, &patch.content) {
        warn!("Failed to update {}: {}", path.display(), e);
        return PostureChange::Untouched;
    }

    match patch.change {
        PostureChange::Relaxed => {
            info!("First run of the search service, temporarily dropping '{}'", DIRECTIVE);
            warn!("'{}' will be restored on the next launch once the search service has initialized", DIRECTIVE);
        }
        PostureChange::Restored => {
            info!("Search service initialized, re-enabling '{}'", DIRECTIVE);
        }
        PostureChange::Untouched => {}
    }
    patch.change
}
