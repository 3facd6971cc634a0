//! Registry persistence
//!
//! Loading backfills missing fields by overlaying the file's values on
//! freshly built defaults, so a field already present in the file is kept
//! exactly as written whatever schema version produced it. A file that
//! cannot be parsed is copied aside and replaced by an empty registry.

use std::path::{Path, PathBuf};

use chrono::Utc;
use docsync_fs::io;
use semver::Version;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::merge::{overlay, rename_legacy_keys};
use super::{DocumentEntry, Registry, SCHEMA_VERSION};
use crate::{Error, Result};

/// Default registry location relative to the project root.
pub const DEFAULT_REGISTRY_PATH: &str = ".docsync/registry.json";

/// How [`RegistryStore::load_with_status`] obtained its registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No file existed; a new empty registry was created in memory.
    Fresh,
    /// The file parsed. `migrated_from` is set when it carried an older schema.
    Loaded { migrated_from: Option<String> },
    /// The file was corrupt and has been replaced by an empty registry.
    Recovered {
        backup: Option<PathBuf>,
        reason: String,
    },
}

/// Reads and writes the registry file.
#[derive(Debug, Clone)]
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location inside `root`.
    pub fn for_project(root: &Path) -> Self {
        Self::new(root.join(DEFAULT_REGISTRY_PATH))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the registry, recovering from corruption.
    pub fn load(&self) -> Result<Registry> {
        self.load_with_status().map(|(registry, _)| registry)
    }

    /// Load the registry and report how it was obtained.
    ///
    /// # Errors
    ///
    /// Only an unreadable or unwritable file is an error. Corrupt content
    /// is copied aside, replaced on disk by an empty registry, and reported
    /// as [`LoadStatus::Recovered`]. If the copy fails the corrupt file is
    /// left in place.
    pub fn load_with_status(&self) -> Result<(Registry, LoadStatus)> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No registry file, starting empty");
            return Ok((Registry::new(Utc::now()), LoadStatus::Fresh));
        }

        let raw = io::read_text(&self.path)?;
        match Self::parse(&self.path, &raw) {
            Ok((registry, migrated_from)) => {
                if let Some(from) = &migrated_from {
                    info!(from = %from, to = SCHEMA_VERSION, "Migrated registry schema");
                }
                Ok((registry, LoadStatus::Loaded { migrated_from }))
            }
            Err(err) => {
                let reason = err.to_string();
                let backup = self.backup_corrupt();
                warn!(
                    path = %self.path.display(),
                    backup = ?backup,
                    error = %reason,
                    "Registry is corrupt; replacing it with an empty registry"
                );
                let mut fresh = Registry::new(Utc::now());
                // Without a backup the corrupt file is the only copy left.
                if backup.is_some() {
                    self.save(&mut fresh)?;
                }
                Ok((fresh, LoadStatus::Recovered { backup, reason }))
            }
        }
    }

    /// Parse registry JSON, backfilling defaults and migrating legacy names.
    ///
    /// Returns the registry and the schema version it was migrated from,
    /// if any. `path` is only used for error messages.
    pub fn parse(path: &Path, raw: &str) -> Result<(Registry, Option<String>)> {
        let corrupt = |message: String| Error::RegistryCorrupt {
            path: path.to_path_buf(),
            message,
        };

        let mut loaded: Value = serde_json::from_str(raw).map_err(|e| corrupt(e.to_string()))?;
        if !loaded.is_object() {
            return Err(corrupt("top level is not an object".into()));
        }
        rename_legacy_keys(&mut loaded);

        let now = Utc::now();
        let mut entries = serde_json::Map::new();
        if let Some(raw_entries) = loaded.as_object_mut().and_then(|o| o.remove("entries")) {
            let Value::Object(raw_entries) = raw_entries else {
                return Err(corrupt("entries is not an object".into()));
            };
            for (key, value) in raw_entries {
                if !value.is_object() {
                    return Err(corrupt(format!("entry '{key}' is not an object")));
                }
                let mut merged = serde_json::to_value(DocumentEntry::new(key.as_str(), now))?;
                overlay(&mut merged, value);
                merged["local_path"] = Value::String(key.clone());
                entries.insert(key, merged);
            }
        }

        let mut merged = serde_json::to_value(Registry::new(now))?;
        overlay(&mut merged, loaded);
        merged["entries"] = Value::Object(entries);

        let mut registry: Registry =
            serde_json::from_value(merged).map_err(|e| corrupt(e.to_string()))?;
        let migrated_from = migrate_schema(&mut registry);
        Ok((registry, migrated_from))
    }

    /// Write the full registry atomically.
    ///
    /// Always refreshes `document_count` and `last_updated_at`.
    pub fn save(&self, registry: &mut Registry) -> Result<()> {
        registry.touch(Utc::now());
        let mut json = serde_json::to_string_pretty(registry)?;
        json.push('\n');
        io::write_text(&self.path, &json)?;
        debug!(path = %self.path.display(), entries = registry.len(), "Saved registry");
        Ok(())
    }

    fn backup_corrupt(&self) -> Option<PathBuf> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "registry.json".to_string());
        let mut backup = self.path.with_file_name(format!("{name}.corrupt-{stamp}"));
        let mut n = 1;
        while backup.exists() {
            backup = self
                .path
                .with_file_name(format!("{name}.corrupt-{stamp}-{n}"));
            n += 1;
        }
        match io::copy_file(&self.path, &backup) {
            Ok(()) => Some(backup),
            Err(err) => {
                warn!(error = %err, "Could not back up corrupt registry");
                None
            }
        }
    }
}

/// Accepts both full semver and the short `major.minor` form.
fn parse_schema_version(raw: &str) -> Option<Version> {
    Version::parse(raw)
        .or_else(|_| Version::parse(&format!("{raw}.0")))
        .ok()
}

fn migrate_schema(registry: &mut Registry) -> Option<String> {
    let stored = registry.project_state.schema_version.clone();
    let current = parse_schema_version(SCHEMA_VERSION)?;
    match parse_schema_version(&stored) {
        Some(version) if version < current => {
            registry.project_state.schema_version = SCHEMA_VERSION.to_string();
            Some(stored)
        }
        Some(version) if version > current => {
            warn!(
                found = %stored,
                supported = SCHEMA_VERSION,
                "Registry was written by a newer version; unknown fields are preserved"
            );
            None
        }
        Some(_) => None,
        None => {
            warn!(found = %stored, "Unrecognised registry schema version, rewriting as current");
            registry.project_state.schema_version = SCHEMA_VERSION.to_string();
            Some(stored)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DocStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(raw: Value) -> (Registry, Option<String>) {
        RegistryStore::parse(Path::new("registry.json"), &raw.to_string()).unwrap()
    }

    #[test]
    fn minimal_file_gets_defaults() {
        let (registry, migrated) = parse(json!({}));
        assert!(registry.is_empty());
        assert_eq!(registry.project_state.schema_version, SCHEMA_VERSION);
        assert_eq!(migrated, None);
    }

    #[test]
    fn entry_fields_are_backfilled_not_overwritten() {
        let (registry, _) = parse(json!({
            "project_state": {"schema_version": SCHEMA_VERSION},
            "entries": {
                "a.md": {
                    "created_at": "2023-05-01T10:00:00Z",
                    "remote_doc_id": "doc-1",
                    "status": "active"
                }
            }
        }));
        let entry = registry.get("a.md").unwrap();
        assert_eq!(entry.local_path, "a.md");
        assert_eq!(entry.created_at.to_rfc3339(), "2023-05-01T10:00:00+00:00");
        assert_eq!(entry.remote_doc_id.as_deref(), Some("doc-1"));
        assert_eq!(entry.status, DocStatus::Active);
        assert_eq!(entry.source, "unknown");
        assert!(entry.dependencies.is_empty());
    }

    #[test]
    fn legacy_registry_is_migrated() {
        let (registry, migrated) = parse(json!({
            "project_state": {"registry_version": "1.1.0", "document_count": 1},
            "document_registry": {
                "a.md": {"google_doc_id": "doc-9", "status": "error_gdoc_trashed"}
            },
            "sync_preferences": {"google_drive_folder": {"name": "Docs", "id": "f1"}}
        }));
        assert_eq!(migrated.as_deref(), Some("1.1.0"));
        assert_eq!(registry.project_state.schema_version, SCHEMA_VERSION);
        let entry = registry.get("a.md").unwrap();
        assert_eq!(entry.remote_doc_id.as_deref(), Some("doc-9"));
        assert_eq!(entry.status, DocStatus::ErrorRemoteTrashed);
        assert_eq!(registry.sync_preferences.target_folder.id, "f1");
    }

    #[test]
    fn newer_schema_is_kept() {
        let (registry, migrated) = parse(json!({
            "project_state": {"schema_version": "9.0.0", "shard": 3},
            "entries": {}
        }));
        assert_eq!(migrated, None);
        assert_eq!(registry.project_state.schema_version, "9.0.0");
        assert_eq!(registry.project_state.extra["shard"], 3);
    }

    #[test]
    fn non_object_entry_is_corrupt() {
        let err = RegistryStore::parse(Path::new("r.json"), r#"{"entries": {"a.md": 4}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::RegistryCorrupt { .. }));
    }

    #[test]
    fn garbage_is_corrupt() {
        let err = RegistryStore::parse(Path::new("r.json"), "{ not json").unwrap_err();
        assert!(matches!(err, Error::RegistryCorrupt { .. }));
    }

    #[test]
    fn short_schema_versions_parse() {
        assert_eq!(parse_schema_version("1.0"), Some(Version::new(1, 0, 0)));
        assert_eq!(parse_schema_version("x"), None);
    }
}
