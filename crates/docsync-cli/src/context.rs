//! Project context detection
//!
//! Commands work from anywhere inside a project: the root is the nearest
//! ancestor holding a `.docsync/` directory.

use std::path::{Path, PathBuf};

use docsync_core::{DirectoryRemote, Manifest, RegistryStore, RetryingRemote, find_project_root};
use tracing::warn;

use crate::error::Result;

/// Root directory plus its parsed manifest.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub manifest: Manifest,
}

impl ProjectContext {
    /// Detect the project containing `cwd`.
    ///
    /// Falls back to `cwd` itself when no `.docsync/` directory is found.
    pub fn detect(cwd: &Path) -> Result<Self> {
        let root = find_project_root(cwd).unwrap_or_else(|| {
            warn!(dir = %cwd.display(), "No .docsync directory found, using current directory");
            cwd.to_path_buf()
        });
        let manifest = Manifest::load(&root)?;
        Ok(Self { root, manifest })
    }

    pub fn store(&self) -> RegistryStore {
        self.manifest.registry_store(&self.root)
    }

    /// The configured remote, wrapped in the configured retry policy.
    pub fn remote(&self) -> RetryingRemote<DirectoryRemote> {
        RetryingRemote::new(
            DirectoryRemote::new(self.manifest.remote_directory(&self.root)),
            self.manifest.retry_policy(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detects_root_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".docsync")).unwrap();
        let nested = temp.path().join("docs").join("guides");
        fs::create_dir_all(&nested).unwrap();

        let ctx = ProjectContext::detect(&nested).unwrap();
        assert_eq!(ctx.root, temp.path());
    }

    #[test]
    fn test_falls_back_to_cwd() {
        let temp = TempDir::new().unwrap();
        let ctx = ProjectContext::detect(temp.path()).unwrap();
        assert_eq!(ctx.root, temp.path());
        assert_eq!(
            ctx.store().path(),
            temp.path().join(".docsync").join("registry.json")
        );
    }

    #[test]
    fn test_invalid_manifest_is_an_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".docsync")).unwrap();
        fs::write(temp.path().join(".docsync").join("config.toml"), "[retry\n").unwrap();
        assert!(ProjectContext::detect(temp.path()).is_err());
    }
}
