//! Registry entry and status types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Placeholder some registries carry in `remote_doc_id` to request creation.
pub const PENDING_CREATION: &str = "CREATE_NEW_DOCUMENT";

/// Sync status of a tracked document.
///
/// Serialized as snake_case strings. Legacy status names are mapped on
/// load; unrecognised names load as [`DocStatus::New`] because the next
/// pass recomputes the status anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocStatus {
    #[default]
    New,
    LocalOnly,
    Active,
    LocalChanged,
    RemoteChanged,
    Conflict,
    ErrorLocalMissing,
    ErrorRemoteTrashed,
    ErrorRemoteNotFound,
    SyncFailed,
    CreationFailed,
}

impl DocStatus {
    pub const ALL: [DocStatus; 11] = [
        DocStatus::New,
        DocStatus::LocalOnly,
        DocStatus::Active,
        DocStatus::LocalChanged,
        DocStatus::RemoteChanged,
        DocStatus::Conflict,
        DocStatus::ErrorLocalMissing,
        DocStatus::ErrorRemoteTrashed,
        DocStatus::ErrorRemoteNotFound,
        DocStatus::SyncFailed,
        DocStatus::CreationFailed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocStatus::New => "new",
            DocStatus::LocalOnly => "local_only",
            DocStatus::Active => "active",
            DocStatus::LocalChanged => "local_changed",
            DocStatus::RemoteChanged => "remote_changed",
            DocStatus::Conflict => "conflict",
            DocStatus::ErrorLocalMissing => "error_local_missing",
            DocStatus::ErrorRemoteTrashed => "error_remote_trashed",
            DocStatus::ErrorRemoteNotFound => "error_remote_not_found",
            DocStatus::SyncFailed => "sync_failed",
            DocStatus::CreationFailed => "creation_failed",
        }
    }

    /// Parse a current or legacy status name.
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(status) = Self::ALL.iter().find(|s| s.as_str() == name) {
            return Some(*status);
        }
        match name {
            "error_gdoc_trashed" | "local_only_gdoc_trashed" => Some(DocStatus::ErrorRemoteTrashed),
            "error_gdoc_not_found" | "local_only_gdoc_not_found" => {
                Some(DocStatus::ErrorRemoteNotFound)
            }
            "migrated" | "active_local_hash_updated" | "active_gdoc_version_updated" => {
                Some(DocStatus::Active)
            }
            "migrated_placeholder" | "local_only_needs_gdoc_creation" => Some(DocStatus::New),
            _ => None,
        }
    }

    /// Statuses that leave the entry needing operator attention.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            DocStatus::ErrorLocalMissing
                | DocStatus::ErrorRemoteTrashed
                | DocStatus::ErrorRemoteNotFound
                | DocStatus::SyncFailed
                | DocStatus::CreationFailed
        )
    }

    /// The remote counterpart was found missing.
    pub fn is_remote_error(self) -> bool {
        matches!(
            self,
            DocStatus::ErrorRemoteTrashed | DocStatus::ErrorRemoteNotFound
        )
    }
}

impl fmt::Display for DocStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown status '{s}'"))
    }
}

impl From<String> for DocStatus {
    fn from(name: String) -> Self {
        Self::parse(&name).unwrap_or_else(|| {
            warn!(status = %name, "Unknown status in registry, treating as new");
            DocStatus::New
        })
    }
}

impl From<DocStatus> for String {
    fn from(status: DocStatus) -> Self {
        status.as_str().to_string()
    }
}

fn default_source() -> String {
    "unknown".to_string()
}

/// A tracked document and its last successfully reconciled state.
///
/// `local_content_hash` and `remote_version` form the stored snapshot:
/// they only change when a pass confirms a transfer (or an operator
/// adopts the live value during repair).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    /// Registry key, relative to the project root with forward slashes.
    #[serde(default)]
    pub local_path: String,
    #[serde(default)]
    pub tier: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub last_modified_local_at: DateTime<Utc>,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub local_content_hash: Option<String>,
    #[serde(default)]
    pub remote_doc_id: Option<String>,
    #[serde(default)]
    pub remote_version: Option<String>,
    #[serde(default)]
    pub remote_last_known_good_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: DocStatus,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Fields written by newer schema versions, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DocumentEntry {
    /// A fresh entry with every optional field unset.
    pub fn new(local_path: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            local_path: local_path.into(),
            tier: None,
            created_at: now,
            last_modified_local_at: now,
            last_synced_at: None,
            local_content_hash: None,
            remote_doc_id: None,
            remote_version: None,
            remote_last_known_good_at: None,
            status: DocStatus::New,
            source: default_source(),
            dependencies: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// The linked remote id, ignoring the pending-creation placeholder.
    pub fn remote_id(&self) -> Option<&str> {
        self.remote_doc_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != PENDING_CREATION)
    }

    pub fn has_remote(&self) -> bool {
        self.remote_id().is_some()
    }

    /// Drop the remote link and everything recorded about it.
    pub fn unlink_remote(&mut self) {
        self.remote_doc_id = None;
        self.remote_version = None;
        self.remote_last_known_good_at = None;
    }

    /// Document title derived from the file name (`docs/guide.md` -> `guide`).
    pub fn title(&self) -> String {
        docsync_fs::NormalizedPath::new(&self.local_path)
            .file_stem()
            .unwrap_or(&self.local_path)
            .to_string()
    }
}

/// Partial update applied by [`super::Registry::upsert`].
///
/// Only the fields set here overwrite the existing (or default) entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DocStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_content_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_local_at: Option<DateTime<Utc>>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.tier.is_none()
            && self.status.is_none()
            && self.source.is_none()
            && self.local_content_hash.is_none()
            && self.remote_doc_id.is_none()
            && self.remote_version.is_none()
            && self.dependencies.is_none()
            && self.created_at.is_none()
            && self.last_modified_local_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DocStatus::ErrorRemoteNotFound).unwrap();
        assert_eq!(json, "\"error_remote_not_found\"");
        let back: DocStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DocStatus::ErrorRemoteNotFound);
    }

    #[rstest]
    #[case("error_gdoc_trashed", DocStatus::ErrorRemoteTrashed)]
    #[case("error_gdoc_not_found", DocStatus::ErrorRemoteNotFound)]
    #[case("migrated", DocStatus::Active)]
    #[case("migrated_placeholder", DocStatus::New)]
    #[case("something_from_the_future", DocStatus::New)]
    fn legacy_and_unknown_statuses_load(#[case] raw: &str, #[case] expected: DocStatus) {
        let status: DocStatus = serde_json::from_value(Value::String(raw.into())).unwrap();
        assert_eq!(status, expected);
    }

    #[test]
    fn from_str_is_strict() {
        assert_eq!("conflict".parse::<DocStatus>(), Ok(DocStatus::Conflict));
        assert!("nonsense".parse::<DocStatus>().is_err());
    }

    #[test]
    fn placeholder_is_not_a_remote() {
        let mut entry = DocumentEntry::new("a.md", Utc::now());
        entry.remote_doc_id = Some(PENDING_CREATION.to_string());
        assert!(!entry.has_remote());
        entry.remote_doc_id = Some("doc-1".to_string());
        assert_eq!(entry.remote_id(), Some("doc-1"));
    }

    #[test]
    fn title_strips_directory_and_extension() {
        let entry = DocumentEntry::new("docs/project_instructions.md", Utc::now());
        assert_eq!(entry.title(), "project_instructions");
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = serde_json::json!({
            "local_path": "a.md",
            "created_at": "2024-01-01T00:00:00Z",
            "last_modified_local_at": "2024-01-01T00:00:00Z",
            "review_owner": "ops"
        });
        let entry: DocumentEntry = serde_json::from_value(raw).unwrap();
        assert_eq!(entry.extra["review_owner"], "ops");
        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["review_owner"], "ops");
    }
}
