//! Operator decisions as pluggable policy objects
//!
//! Every point where a pass needs a human choice goes through a
//! [`ResolutionPolicy`]. Interactive front ends prompt; the
//! [`NonInteractivePolicy`] answers from fixed defaults that never discard
//! data on either side.

use crate::registry::{DocStatus, DocumentEntry, TargetFolder};
use crate::remote::RemoteMetadata;

/// Why a linked remote document could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteIssue {
    NotFound,
    Trashed,
}

impl RemoteIssue {
    /// Entry status recorded for this issue.
    pub fn status(self) -> DocStatus {
        match self {
            RemoteIssue::NotFound => DocStatus::ErrorRemoteNotFound,
            RemoteIssue::Trashed => DocStatus::ErrorRemoteTrashed,
        }
    }
}

/// Choice for an entry whose local file is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalMissingDecision {
    /// Unregister the entry. The remote document is not deleted.
    RemoveEntry,
    /// Keep the entry but drop its remote link.
    UnlinkRemote,
    Skip,
    Abort,
}

/// Choice for an entry whose remote document is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMissingDecision {
    /// Create a fresh remote document and link it.
    CreateNew,
    /// Drop the link and keep the local file.
    Unlink,
    Skip,
    Abort,
}

/// Choice for an entry changed on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionDecision {
    PushLocal,
    PullRemote,
    Skip,
    Abort,
}

/// Source of operator decisions during sync and repair passes.
pub trait ResolutionPolicy {
    fn on_local_missing(&mut self, entry: &DocumentEntry) -> LocalMissingDecision;

    fn on_remote_missing(&mut self, entry: &DocumentEntry, issue: RemoteIssue)
    -> RemoteMissingDecision;

    fn on_conflict(&mut self, entry: &DocumentEntry, live: &RemoteMetadata) -> ResolutionDecision;

    /// Repair only: accept the current local hash without pushing.
    fn adopt_local_hash(&mut self, entry: &DocumentEntry, current_hash: &str) -> bool;

    /// Repair only: accept the live remote version without pulling.
    fn adopt_remote_version(&mut self, entry: &DocumentEntry, live: &RemoteMetadata) -> bool;

    /// Folder for new documents when neither an override nor a stored
    /// preference exists.
    fn choose_target_folder(&mut self) -> Option<TargetFolder>;
}

/// Fixed answers, for unattended runs.
///
/// The default leaves conflicts and missing local files untouched, unlinks
/// missing remotes, and never adopts live values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonInteractivePolicy {
    pub local_missing: LocalMissingDecision,
    pub remote_missing: RemoteMissingDecision,
    pub conflict: ResolutionDecision,
    pub adopt_hash: bool,
    pub adopt_version: bool,
    pub target_folder: Option<TargetFolder>,
}

impl Default for NonInteractivePolicy {
    fn default() -> Self {
        Self {
            local_missing: LocalMissingDecision::Skip,
            remote_missing: RemoteMissingDecision::Unlink,
            conflict: ResolutionDecision::Skip,
            adopt_hash: false,
            adopt_version: false,
            target_folder: None,
        }
    }
}

impl ResolutionPolicy for NonInteractivePolicy {
    fn on_local_missing(&mut self, _entry: &DocumentEntry) -> LocalMissingDecision {
        self.local_missing
    }

    fn on_remote_missing(
        &mut self,
        _entry: &DocumentEntry,
        _issue: RemoteIssue,
    ) -> RemoteMissingDecision {
        self.remote_missing
    }

    fn on_conflict(&mut self, _entry: &DocumentEntry, _live: &RemoteMetadata) -> ResolutionDecision {
        self.conflict
    }

    fn adopt_local_hash(&mut self, _entry: &DocumentEntry, _current_hash: &str) -> bool {
        self.adopt_hash
    }

    fn adopt_remote_version(&mut self, _entry: &DocumentEntry, _live: &RemoteMetadata) -> bool {
        self.adopt_version
    }

    fn choose_target_folder(&mut self) -> Option<TargetFolder> {
        self.target_folder.clone()
    }
}
