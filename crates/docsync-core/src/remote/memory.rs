//! In-memory remote accessor
//!
//! Keeps documents in a map, records every call, and can be scripted to
//! fail. Used by the test suites to assert exactly which remote calls a
//! pass made.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{
    CreatedDocument, RemoteAccessor, RemoteError, RemoteMetadata, RemoteResult, RemoteRevision,
};

/// Which accessor operation a call or scripted failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    GetMetadata,
    Create,
    ReplaceContent,
    ExportAsText,
}

/// A recorded accessor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub op: RemoteOp,
    /// Document id, or the title for `Create`.
    pub target: String,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    title: String,
    folder_id: Option<String>,
    text: String,
    version: String,
    modified_time: DateTime<Utc>,
    trashed: bool,
}

#[derive(Debug, Default)]
struct State {
    documents: BTreeMap<String, StoredDocument>,
    calls: Vec<RemoteCall>,
    failures: VecDeque<(RemoteOp, RemoteError)>,
    next_id: u64,
    next_revision: u64,
}

impl State {
    fn revision(&mut self) -> String {
        self.next_revision += 1;
        format!("rev-{}", self.next_revision)
    }

    fn take_failure(&mut self, op: RemoteOp) -> Option<RemoteError> {
        let idx = self.failures.iter().position(|(o, _)| *o == op)?;
        self.failures.remove(idx).map(|(_, err)| err)
    }

    fn accessible(&self, id: &str) -> RemoteResult<&StoredDocument> {
        let doc = self.documents.get(id).ok_or_else(|| RemoteError::NotFound {
            id: id.to_string(),
        })?;
        if doc.trashed {
            return Err(RemoteError::Trashed { id: id.to_string() });
        }
        Ok(doc)
    }
}

/// A scriptable in-memory [`RemoteAccessor`].
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<State>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test thread must not cascade into every later assertion.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a document and return its revision.
    pub fn insert_document(&self, id: &str, text: &str) -> String {
        let mut state = self.lock();
        let version = state.revision();
        state.documents.insert(
            id.to_string(),
            StoredDocument {
                title: id.to_string(),
                folder_id: None,
                text: text.to_string(),
                version: version.clone(),
                modified_time: Utc::now(),
                trashed: false,
            },
        );
        version
    }

    /// Simulate an edit made by someone else; returns the new revision.
    ///
    /// Not recorded as a call.
    pub fn edit_externally(&self, id: &str, text: &str) -> Option<String> {
        let mut state = self.lock();
        let version = state.revision();
        let doc = state.documents.get_mut(id)?;
        doc.text = text.to_string();
        doc.version = version.clone();
        doc.modified_time = Utc::now();
        Some(version)
    }

    /// Move a document to the trash.
    pub fn trash(&self, id: &str) {
        if let Some(doc) = self.lock().documents.get_mut(id) {
            doc.trashed = true;
        }
    }

    /// Delete a document permanently.
    pub fn delete(&self, id: &str) {
        self.lock().documents.remove(id);
    }

    /// Make the next call of `op` fail with `err`. Failures queue per op.
    pub fn fail_next(&self, op: RemoteOp, err: RemoteError) {
        self.lock().failures.push_back((op, err));
    }

    /// Current text of a document, if it exists.
    pub fn text(&self, id: &str) -> Option<String> {
        self.lock().documents.get(id).map(|d| d.text.clone())
    }

    /// Current revision of a document, if it exists.
    pub fn version(&self, id: &str) -> Option<String> {
        self.lock().documents.get(id).map(|d| d.version.clone())
    }

    /// Title and folder a document was created with.
    pub fn placement(&self, id: &str) -> Option<(String, Option<String>)> {
        self.lock()
            .documents
            .get(id)
            .map(|d| (d.title.clone(), d.folder_id.clone()))
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Calls of one kind.
    pub fn calls_of(&self, op: RemoteOp) -> Vec<RemoteCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    /// Number of calls that write to the remote (create and replace).
    pub fn write_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c.op, RemoteOp::Create | RemoteOp::ReplaceContent))
            .count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn record(state: &mut State, op: RemoteOp, target: &str) -> RemoteResult<()> {
        state.calls.push(RemoteCall {
            op,
            target: target.to_string(),
        });
        match state.take_failure(op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl RemoteAccessor for InMemoryRemote {
    fn get_metadata(&self, id: &str) -> RemoteResult<RemoteMetadata> {
        let mut state = self.lock();
        Self::record(&mut state, RemoteOp::GetMetadata, id)?;
        let doc = state.documents.get(id).ok_or_else(|| RemoteError::NotFound {
            id: id.to_string(),
        })?;
        Ok(RemoteMetadata {
            id: id.to_string(),
            trashed: doc.trashed,
            version: doc.version.clone(),
            modified_time: Some(doc.modified_time),
        })
    }

    fn create(&self, title: &str, folder_id: Option<&str>) -> RemoteResult<CreatedDocument> {
        let mut state = self.lock();
        Self::record(&mut state, RemoteOp::Create, title)?;
        state.next_id += 1;
        let id = format!("doc-{}", state.next_id);
        let version = state.revision();
        let modified_time = Utc::now();
        state.documents.insert(
            id.clone(),
            StoredDocument {
                title: title.to_string(),
                folder_id: folder_id.map(str::to_string),
                text: String::new(),
                version: version.clone(),
                modified_time,
                trashed: false,
            },
        );
        Ok(CreatedDocument {
            id,
            version,
            modified_time: Some(modified_time),
        })
    }

    fn replace_content(&self, id: &str, text: &str) -> RemoteResult<RemoteRevision> {
        let mut state = self.lock();
        Self::record(&mut state, RemoteOp::ReplaceContent, id)?;
        state.accessible(id)?;
        let version = state.revision();
        let modified_time = Utc::now();
        if let Some(doc) = state.documents.get_mut(id) {
            doc.text = text.to_string();
            doc.version = version.clone();
            doc.modified_time = modified_time;
        }
        Ok(RemoteRevision {
            version,
            modified_time: Some(modified_time),
        })
    }

    fn export_as_text(&self, id: &str) -> RemoteResult<String> {
        let mut state = self.lock();
        Self::record(&mut state, RemoteOp::ExportAsText, id)?;
        Ok(state.accessible(id)?.text.clone())
    }
}
