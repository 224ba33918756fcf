//! Throwaway project trees on disk

use localai_core::directive::DIRECTIVE;
use localai_core::layout::ProjectLayout;
use localai_core::secret::SECRET_PLACEHOLDER;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

use super::catalog_builder::TestCatalogBuilder;

/// A temporary project directory with the files a launch expects
pub struct TestProject {
    dir: TempDir,
    layout: ProjectLayout,
}

impl TestProject {
    /// Compose file with an enforced `cap_drop`, search settings template and
    /// a root `.env`
    pub fn new() -> Self {
        let project = Self::empty();
        project.write("docker-compose.yml", &Self::compose_content());
        project.write(
            "searxng/settings-base.yml",
            &format!("server:\n  secret_key: \"{}\"\n", SECRET_PLACEHOLDER),
        );
        project.write(".env", "POSTGRES_PASSWORD=secret\nJWT_SECRET=jwt\n");
        project
    }

    /// An empty project directory
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {}", e));
        let layout = ProjectLayout::new(dir.path());
        Self { dir, layout }
    }

    pub fn compose_content() -> String {
        format!(
            "services:\n  searxng:\n    image: searxng/searxng\n    {}\n  n8n:\n    image: n8nio/n8n\n",
            DIRECTIVE
        )
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Write `content` to a project-relative path, creating parents
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("mkdir {}: {}", parent.display(), e));
        }
        fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {}", path.display(), e));
    }

    pub fn read(&self, relative: &str) -> String {
        let path = self.dir.path().join(relative);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {}", path.display(), e))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.dir.path().join(relative).exists()
    }

    pub fn with_catalog(self, catalog: &TestCatalogBuilder) -> Self {
        catalog
            .write_to(&self.layout.services_config())
            .unwrap_or_else(|e| panic!("write services config: {}", e));
        self
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
