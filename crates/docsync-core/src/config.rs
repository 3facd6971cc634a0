//! Project configuration
//!
//! A docsync project is any directory containing `.docsync/`. Settings come
//! from `.docsync/config.toml`; every section is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::registry::RegistryStore;
use crate::remote::RetryPolicy;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".docsync";

/// Configuration file inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

fn default_remote_directory() -> String {
    ".docsync/remote".to_string()
}

fn default_registry_path() -> String {
    ".docsync/registry.json".to_string()
}

/// `[remote]`: where the directory-backed remote keeps its documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSection {
    #[serde(default = "default_remote_directory")]
    pub directory: String,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            directory: default_remote_directory(),
        }
    }
}

/// `[retry]`: backoff applied to every remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_interval_ms: 500,
            max_interval_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

/// `[registry]`: registry file location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrySection {
    #[serde(default = "default_registry_path")]
    pub path: String,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

/// Parsed `.docsync/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub registry: RegistrySection,
}

impl Manifest {
    /// Parse a manifest from TOML content.
    ///
    /// ```
    /// use docsync_core::config::Manifest;
    ///
    /// let manifest = Manifest::parse("[retry]\nmax_attempts = 2\n").unwrap();
    /// assert_eq!(manifest.retry.max_attempts, 2);
    /// assert_eq!(manifest.retry.multiplier, 2.0);
    /// ```
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(manifest)
    }

    /// Load `<root>/.docsync/config.toml`, or the defaults when it is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = docsync_fs::io::read_text(&path)?;
        Self::parse(&content)
    }

    pub fn path(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            initial_interval: Duration::from_millis(self.retry.initial_interval_ms),
            max_interval: Duration::from_millis(self.retry.max_interval_ms),
            multiplier: self.retry.multiplier,
        }
    }

    /// The remote directory resolved against the project root.
    pub fn remote_directory(&self, root: &Path) -> PathBuf {
        root.join(&self.remote.directory)
    }

    pub fn registry_store(&self, root: &Path) -> RegistryStore {
        RegistryStore::new(root.join(&self.registry.path))
    }
}

/// Walk up from `start` to the nearest directory containing [`CONFIG_DIR`].
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn empty_manifest_uses_defaults() {
        let manifest = Manifest::parse("").unwrap();
        assert_eq!(manifest, Manifest::default());
        assert_eq!(manifest.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn partial_sections_fill_in() {
        let manifest = Manifest::parse(
            r#"
[remote]
directory = "../shared-remote"

[retry]
max_interval_ms = 1000
"#,
        )
        .unwrap();
        assert_eq!(manifest.remote.directory, "../shared-remote");
        assert_eq!(manifest.retry.max_attempts, 5);
        assert_eq!(
            manifest.retry_policy().max_interval,
            Duration::from_millis(1000)
        );
        assert_eq!(manifest.registry.path, ".docsync/registry.json");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Manifest::parse("[retry\nmax_attempts = ").is_err());
    }

    #[test]
    fn missing_file_loads_default() {
        let temp = TempDir::new().unwrap();
        assert_eq!(Manifest::load(temp.path()).unwrap(), Manifest::default());
    }

    #[test]
    fn finds_root_from_nested_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(CONFIG_DIR)).unwrap();
        let nested = temp.path().join("docs/deep");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested), Some(temp.path().to_path_buf()));
    }
}
