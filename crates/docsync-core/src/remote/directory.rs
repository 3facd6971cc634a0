//! Directory-backed remote accessor
//!
//! Stands in for the remote document service using a plain folder: each
//! document is `<id>.txt` with a `<id>.meta.json` sidecar. Every write mints
//! a fresh revision id, so revision semantics match a real service.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use docsync_fs::io;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    CreatedDocument, RemoteAccessor, RemoteError, RemoteMetadata, RemoteResult, RemoteRevision,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentMeta {
    title: String,
    #[serde(default)]
    folder_id: Option<String>,
    version: String,
    modified_time: DateTime<Utc>,
    #[serde(default)]
    trashed: bool,
}

/// A [`RemoteAccessor`] that stores documents in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryRemote {
    root: PathBuf,
}

impl DirectoryRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn content_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.txt"))
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.meta.json"))
    }

    fn read_meta(&self, id: &str) -> RemoteResult<DocumentMeta> {
        if !is_valid_id(id) {
            return Err(RemoteError::NotFound { id: id.to_string() });
        }
        let raw = fs::read_to_string(self.meta_path(id)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => RemoteError::NotFound { id: id.to_string() },
            _ => transport(e),
        })?;
        serde_json::from_str(&raw).map_err(|e| RemoteError::Server {
            status: 500,
            message: format!("corrupt metadata for {id}: {e}"),
        })
    }

    fn write_meta(&self, id: &str, meta: &DocumentMeta) -> RemoteResult<()> {
        let json = serde_json::to_vec_pretty(meta).map_err(|e| RemoteError::Rejected {
            message: e.to_string(),
        })?;
        io::write_atomic(&self.meta_path(id), &json).map_err(transport)
    }

    fn accessible_meta(&self, id: &str) -> RemoteResult<DocumentMeta> {
        let meta = self.read_meta(id)?;
        if meta.trashed {
            return Err(RemoteError::Trashed { id: id.to_string() });
        }
        Ok(meta)
    }

    /// Mark a document as trashed without deleting its content.
    pub fn trash(&self, id: &str) -> RemoteResult<()> {
        let mut meta = self.read_meta(id)?;
        meta.trashed = true;
        self.write_meta(id, &meta)
    }
}

impl RemoteAccessor for DirectoryRemote {
    fn get_metadata(&self, id: &str) -> RemoteResult<RemoteMetadata> {
        let meta = self.read_meta(id)?;
        Ok(RemoteMetadata {
            id: id.to_string(),
            trashed: meta.trashed,
            version: meta.version,
            modified_time: Some(meta.modified_time),
        })
    }

    fn create(&self, title: &str, folder_id: Option<&str>) -> RemoteResult<CreatedDocument> {
        let id = Uuid::new_v4().simple().to_string();
        let meta = DocumentMeta {
            title: title.to_string(),
            folder_id: folder_id.map(str::to_string),
            version: new_revision(),
            modified_time: Utc::now(),
            trashed: false,
        };
        io::write_atomic(&self.content_path(&id), b"").map_err(transport)?;
        self.write_meta(&id, &meta)?;
        Ok(CreatedDocument {
            id,
            version: meta.version,
            modified_time: Some(meta.modified_time),
        })
    }

    fn replace_content(&self, id: &str, text: &str) -> RemoteResult<RemoteRevision> {
        let mut meta = self.accessible_meta(id)?;
        io::write_text(&self.content_path(id), text).map_err(transport)?;
        meta.version = new_revision();
        meta.modified_time = Utc::now();
        self.write_meta(id, &meta)?;
        Ok(RemoteRevision {
            version: meta.version,
            modified_time: Some(meta.modified_time),
        })
    }

    fn export_as_text(&self, id: &str) -> RemoteResult<String> {
        self.accessible_meta(id)?;
        io::read_text(&self.content_path(id)).map_err(|e| {
            if e.is_not_found() {
                RemoteError::NotFound { id: id.to_string() }
            } else {
                transport(e)
            }
        })
    }
}

fn new_revision() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Ids are used as file names; anything that could escape the folder is unknown.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn transport(err: impl std::fmt::Display) -> RemoteError {
    RemoteError::Transport {
        message: err.to_string(),
    }
}
