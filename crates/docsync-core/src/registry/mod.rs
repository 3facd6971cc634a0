//! Document registry
//!
//! The registry is the persisted record of every tracked document and the
//! state it was in after the last successful reconciliation. Entries are
//! keyed by their project-relative path and kept in key order, so the
//! serialized file is deterministic.

mod entry;
mod import;
mod merge;
mod store;

pub use entry::{DocStatus, DocumentEntry, EntryPatch, PENDING_CREATION};
pub use import::{ImportReport, import_mapping};
pub use merge::overlay;
pub use store::{LoadStatus, RegistryStore};

use std::collections::{BTreeMap, btree_map};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Schema version written by this build.
pub const SCHEMA_VERSION: &str = "1.2.0";

/// Registry-wide bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub document_count: usize,
    pub schema_version: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Remote folder new documents are created in. Empty fields mean unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFolder {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
}

impl TargetFolder {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    pub fn is_set(&self) -> bool {
        !self.id.is_empty()
    }
}

/// How the operator wants to be consulted during a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    #[default]
    Interactive,
    Auto,
    NonInteractive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncPreferences {
    #[serde(default)]
    pub target_folder: TargetFolder,
    #[serde(default)]
    pub interaction_mode: InteractionMode,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The full registry document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    pub project_state: ProjectState,
    #[serde(default)]
    pub entries: BTreeMap<String, DocumentEntry>,
    #[serde(default)]
    pub sync_preferences: SyncPreferences,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Registry {
    /// An empty registry at the current schema version.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            project_state: ProjectState {
                created_at: now,
                last_updated_at: now,
                document_count: 0,
                schema_version: SCHEMA_VERSION.to_string(),
                extra: BTreeMap::new(),
            },
            entries: BTreeMap::new(),
            sync_preferences: SyncPreferences::default(),
            extra: BTreeMap::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<&DocumentEntry> {
        self.entries.get(path)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut DocumentEntry> {
        self.entries.get_mut(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or replace an entry under its own `local_path`.
    pub fn insert(&mut self, entry: DocumentEntry) -> Option<DocumentEntry> {
        self.entries.insert(entry.local_path.clone(), entry)
    }

    /// Merge `patch` over the existing entry, or over a fresh default one.
    ///
    /// Fields the patch leaves unset keep their current values. Updating an
    /// existing entry bumps `last_modified_local_at` unless the patch sets it.
    pub fn upsert(&mut self, path: &str, patch: EntryPatch) -> Result<&mut DocumentEntry> {
        let now = Utc::now();
        let existed = self.entries.contains_key(path);
        let bump = existed && patch.last_modified_local_at.is_none();

        let current = self
            .entries
            .get(path)
            .cloned()
            .unwrap_or_else(|| DocumentEntry::new(path, now));
        let mut merged = serde_json::to_value(current)?;
        overlay(&mut merged, serde_json::to_value(patch)?);

        let mut entry: DocumentEntry = serde_json::from_value(merged)?;
        entry.local_path = path.to_string();
        if bump {
            entry.last_modified_local_at = now;
        }

        match self.entries.entry(path.to_string()) {
            btree_map::Entry::Occupied(mut slot) => {
                slot.insert(entry);
                Ok(slot.into_mut())
            }
            btree_map::Entry::Vacant(slot) => Ok(slot.insert(entry)),
        }
    }

    /// Unregister a document. The remote counterpart is left untouched.
    pub fn remove(&mut self, path: &str) -> Result<DocumentEntry> {
        self.entries.remove(path).ok_or_else(|| Error::NotTracked {
            path: path.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry keys in processing order.
    pub fn paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DocumentEntry)> {
        self.entries.iter()
    }

    /// The stored target folder, if one has been chosen.
    pub fn target_folder(&self) -> Option<&TargetFolder> {
        Some(&self.sync_preferences.target_folder).filter(|f| f.is_set())
    }

    pub fn set_target_folder(&mut self, folder: TargetFolder) {
        self.sync_preferences.target_folder = folder;
    }

    /// Refresh the derived bookkeeping fields before a save.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.project_state.document_count = self.entries.len();
        self.project_state.last_updated_at = now;
    }
}
