//! Per-run settings passed explicitly to every sync component

use std::path::{Path, PathBuf};

use docsync_fs::NormalizedPath;

use crate::registry::TargetFolder;

/// Settings for one sync or health pass.
#[derive(Debug, Clone)]
pub struct SyncContext {
    /// Project root that registry keys are relative to.
    pub root: PathBuf,
    /// Folder new remote documents are created in. When the orchestrator
    /// runs this starts as the operator override and is replaced by the
    /// resolved folder.
    pub target_folder: Option<TargetFolder>,
    /// Recreate every inaccessible remote without asking.
    pub force_recreate: bool,
    /// Strip markdown escapes from text crossing the remote boundary.
    pub clean_content: bool,
}

impl SyncContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            target_folder: None,
            force_recreate: false,
            clean_content: true,
        }
    }

    pub fn with_target_folder(mut self, folder: TargetFolder) -> Self {
        self.target_folder = Some(folder);
        self
    }

    pub fn with_force_recreate(mut self, force: bool) -> Self {
        self.force_recreate = force;
        self
    }

    pub fn with_clean_content(mut self, clean: bool) -> Self {
        self.clean_content = clean;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a registry key.
    pub fn local_path(&self, key: &str) -> PathBuf {
        self.root.join(NormalizedPath::new(key).to_native())
    }

    pub fn folder_id(&self) -> Option<&str> {
        self.target_folder
            .as_ref()
            .filter(|f| f.is_set())
            .map(|f| f.id.as_str())
    }
}
