//! Observations shared by the reconciliation engine and the health checker

use std::path::Path;

use docsync_fs::{compute_content_checksum, io};

use super::policy::RemoteIssue;
use crate::registry::DocumentEntry;
use crate::remote::{RemoteAccessor, RemoteError, RemoteMetadata};

/// Local side of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LocalState {
    Missing,
    Present { text: String, hash: String },
}

/// Read a local file once, hashing exactly the text that may be pushed.
pub(crate) fn read_local(path: &Path) -> docsync_fs::Result<LocalState> {
    match io::read_text(path) {
        Ok(text) => {
            let hash = compute_content_checksum(&text);
            Ok(LocalState::Present { text, hash })
        }
        Err(err) if err.is_not_found() => Ok(LocalState::Missing),
        Err(err) => Err(err),
    }
}

/// Remote side of an entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RemoteState {
    /// No remote document linked yet.
    Unlinked,
    Live(RemoteMetadata),
    Inaccessible(RemoteIssue),
    /// The remote check itself failed; nothing is known about the document.
    Failed(RemoteError),
}

pub(crate) fn inspect_remote(remote: &dyn RemoteAccessor, entry: &DocumentEntry) -> RemoteState {
    let Some(id) = entry.remote_id() else {
        return RemoteState::Unlinked;
    };
    match remote.get_metadata(id) {
        Ok(meta) if meta.trashed => RemoteState::Inaccessible(RemoteIssue::Trashed),
        Ok(meta) => RemoteState::Live(meta),
        Err(RemoteError::NotFound { .. }) => RemoteState::Inaccessible(RemoteIssue::NotFound),
        Err(RemoteError::Trashed { .. }) => RemoteState::Inaccessible(RemoteIssue::Trashed),
        Err(err) => RemoteState::Failed(err),
    }
}

/// A missing stored hash counts as changed.
pub(crate) fn local_changed(entry: &DocumentEntry, current_hash: &str) -> bool {
    entry.local_content_hash.as_deref() != Some(current_hash)
}

/// Revision comparison. Without a stored version there is no baseline to
/// differ from, so the remote counts as unchanged.
pub(crate) fn remote_changed(entry: &DocumentEntry, live: &RemoteMetadata) -> bool {
    entry
        .remote_version
        .as_deref()
        .is_some_and(|stored| stored != live.version)
}
