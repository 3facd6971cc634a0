//! [`TestProject`] builder for docsync test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary project directory with a `.docsync/` folder and a sibling
/// directory that tests use as the remote store.
///
/// # Example
///
/// ```rust,no_run
/// use docsync_test_utils::TestProject;
///
/// let project = TestProject::new();
/// project.write_doc("docs/guide.md", "# Guide\n");
/// project.assert_file_contains("docs/guide.md", "Guide");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create a project root containing an empty `.docsync/` directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("project").join(".docsync")).unwrap();
        fs::create_dir_all(temp_dir.path().join("remote")).unwrap();
        Self { temp_dir }
    }

    /// The project root.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("project")
    }

    /// Directory outside the project used as the remote store.
    pub fn remote_dir(&self) -> PathBuf {
        self.temp_dir.path().join("remote")
    }

    /// Default registry location.
    pub fn registry_path(&self) -> PathBuf {
        self.root().join(".docsync").join("registry.json")
    }

    /// Write `.docsync/config.toml` pointing the remote at [`Self::remote_dir`].
    ///
    /// Retries are fast so failure tests do not sleep.
    pub fn write_config(&self) {
        let remote = self.remote_dir().to_string_lossy().replace('\\', "/");
        let config = format!(
            "[remote]\ndirectory = \"{remote}\"\n\n[retry]\nmax_attempts = 2\ninitial_interval_ms = 1\nmax_interval_ms = 2\nmultiplier = 1.0\n"
        );
        fs::write(self.root().join(".docsync").join("config.toml"), config).unwrap();
    }

    /// Write a document relative to the project root, creating parents.
    pub fn write_doc(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Read a document relative to the project root.
    pub fn read_doc(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    pub fn remove_doc(&self, path: &str) {
        fs::remove_file(self.root().join(path)).unwrap();
    }

    /// Raw bytes of the registry file, for byte-identity assertions.
    pub fn registry_bytes(&self) -> Vec<u8> {
        fs::read(self.registry_path()).unwrap()
    }

    /// Assert that `path` (relative to the project root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read_doc(path);
        assert!(
            file_content.contains(content),
            "File {path} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }
}

/// True when `path` has a sibling whose name starts with `prefix`.
pub fn has_sibling_with_prefix(path: &Path, prefix: &str) -> bool {
    let Some(dir) = path.parent() else {
        return false;
    };
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .any(|e| e.file_name().to_string_lossy().starts_with(prefix))
        })
        .unwrap_or(false)
}
