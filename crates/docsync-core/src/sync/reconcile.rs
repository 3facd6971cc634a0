//! Per-entry reconciliation
//!
//! Compares an entry's local file and remote document against the stored
//! snapshot and takes the single action that classification calls for.
//! The stored hash and version only move after a confirmed transfer.

use std::fmt;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::conflict::ConflictResolver;
use super::context::SyncContext;
use super::policy::{LocalMissingDecision, RemoteIssue, RemoteMissingDecision, ResolutionPolicy};
use super::inspect::{self, LocalState, RemoteState};
use crate::content;
use crate::registry::{DocStatus, DocumentEntry};
use crate::remote::RemoteAccessor;

/// What a pass did with one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Both sides matched the stored snapshot.
    Unchanged,
    Pushed,
    /// A new remote document was created and filled.
    Created,
    Pulled,
    /// Only the remote changed; nothing was written.
    RemoteChanged,
    /// Both sides changed and the conflict was left for the operator.
    Conflict,
    Skipped,
    /// The operator chose to unregister the entry.
    Removed,
    /// The remote link was dropped.
    Unlinked,
    LocalMissing,
    Failed(String),
    /// The operator aborted the pass at this entry.
    Aborted,
}

impl fmt::Display for EntryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryOutcome::Unchanged => f.write_str("unchanged"),
            EntryOutcome::Pushed => f.write_str("pushed"),
            EntryOutcome::Created => f.write_str("created"),
            EntryOutcome::Pulled => f.write_str("pulled"),
            EntryOutcome::RemoteChanged => f.write_str("remote changed"),
            EntryOutcome::Conflict => f.write_str("conflict"),
            EntryOutcome::Skipped => f.write_str("skipped"),
            EntryOutcome::Removed => f.write_str("removed"),
            EntryOutcome::Unlinked => f.write_str("unlinked"),
            EntryOutcome::LocalMissing => f.write_str("local file missing"),
            EntryOutcome::Failed(reason) => write!(f, "failed: {reason}"),
            EntryOutcome::Aborted => f.write_str("aborted"),
        }
    }
}

/// Reconciles one entry at a time against a remote accessor.
pub struct ReconcileEngine<'a> {
    remote: &'a dyn RemoteAccessor,
    ctx: &'a SyncContext,
}

impl<'a> ReconcileEngine<'a> {
    pub fn new(remote: &'a dyn RemoteAccessor, ctx: &'a SyncContext) -> Self {
        Self { remote, ctx }
    }

    /// Reconcile `entry` in place.
    ///
    /// Per-entry failures are recorded on the entry and returned as
    /// [`EntryOutcome::Failed`]; they never stop the caller's pass. A
    /// [`EntryOutcome::Removed`] result asks the caller to unregister it.
    pub fn reconcile(
        &self,
        entry: &mut DocumentEntry,
        policy: &mut dyn ResolutionPolicy,
    ) -> EntryOutcome {
        let path = self.ctx.local_path(&entry.local_path);
        let (text, hash) = match inspect::read_local(&path) {
            Ok(LocalState::Present { text, hash }) => (text, hash),
            Ok(LocalState::Missing) => return self.local_missing(entry, policy),
            Err(err) => {
                warn!(path = %entry.local_path, error = %err, "Cannot read local file");
                entry.status = DocStatus::SyncFailed;
                return EntryOutcome::Failed(err.to_string());
            }
        };
        let local_changed = inspect::local_changed(entry, &hash);

        let live = match inspect::inspect_remote(self.remote, entry) {
            RemoteState::Unlinked => {
                if entry.status.is_remote_error() && !self.ctx.force_recreate {
                    debug!(path = %entry.local_path, status = %entry.status, "Unlinked after remote loss, not recreating");
                    return EntryOutcome::Skipped;
                }
                return self.create_and_push(entry, &text, &hash);
            }
            RemoteState::Inaccessible(issue) => {
                return self.remote_missing(entry, issue, &text, &hash, policy);
            }
            RemoteState::Failed(err) => {
                warn!(path = %entry.local_path, error = %err, "Remote check failed");
                entry.status = DocStatus::SyncFailed;
                return EntryOutcome::Failed(err.to_string());
            }
            RemoteState::Live(meta) => meta,
        };
        let remote_changed = inspect::remote_changed(entry, &live);
        debug!(
            path = %entry.local_path,
            local_changed,
            remote_changed,
            "Classified entry"
        );

        match (local_changed, remote_changed) {
            (false, false) => {
                entry.status = DocStatus::Active;
                if entry.remote_version.is_none() {
                    entry.remote_version = Some(live.version.clone());
                }
                if live.modified_time.is_some() {
                    entry.remote_last_known_good_at = live.modified_time;
                }
                EntryOutcome::Unchanged
            }
            (true, false) => self.push(entry, &live.id, &text, &hash),
            (false, true) => {
                warn!(path = %entry.local_path, "Remote document changed since last sync");
                entry.status = DocStatus::RemoteChanged;
                EntryOutcome::RemoteChanged
            }
            (true, true) => ConflictResolver::new(self.remote, self.ctx)
                .resolve(entry, &text, &hash, &live, policy),
        }
    }

    /// Overwrite the remote document with local text.
    ///
    /// The snapshot moves to `hash` and the returned revision only when the
    /// write succeeds; on failure it is left exactly as it was.
    pub(crate) fn push(
        &self,
        entry: &mut DocumentEntry,
        id: &str,
        text: &str,
        hash: &str,
    ) -> EntryOutcome {
        let body = content::prepare(text, self.ctx.clean_content);
        match self.remote.replace_content(id, &body) {
            Ok(revision) => {
                let now = Utc::now();
                entry.local_content_hash = Some(hash.to_string());
                entry.remote_version = Some(revision.version);
                entry.last_synced_at = Some(now);
                entry.remote_last_known_good_at = Some(revision.modified_time.unwrap_or(now));
                entry.status = DocStatus::Active;
                info!(path = %entry.local_path, id, "Pushed local changes");
                EntryOutcome::Pushed
            }
            Err(err) => {
                warn!(path = %entry.local_path, id, error = %err, "Push failed");
                entry.status = DocStatus::SyncFailed;
                EntryOutcome::Failed(err.to_string())
            }
        }
    }

    fn create_and_push(&self, entry: &mut DocumentEntry, text: &str, hash: &str) -> EntryOutcome {
        let title = entry.title();
        let created = match self.remote.create(&title, self.ctx.folder_id()) {
            Ok(created) => created,
            Err(err) => {
                warn!(path = %entry.local_path, error = %err, "Could not create remote document");
                entry.status = DocStatus::CreationFailed;
                return EntryOutcome::Failed(err.to_string());
            }
        };
        info!(path = %entry.local_path, id = %created.id, "Created remote document");

        // The link is real as soon as the document exists, even if the
        // following push fails.
        entry.remote_doc_id = Some(created.id.clone());
        entry.remote_version = Some(created.version);
        entry.remote_last_known_good_at = created.modified_time;

        match self.push(entry, &created.id, text, hash) {
            EntryOutcome::Pushed => EntryOutcome::Created,
            other => other,
        }
    }

    fn local_missing(
        &self,
        entry: &mut DocumentEntry,
        policy: &mut dyn ResolutionPolicy,
    ) -> EntryOutcome {
        warn!(path = %entry.local_path, "Local file is missing");
        entry.status = DocStatus::ErrorLocalMissing;
        match policy.on_local_missing(entry) {
            LocalMissingDecision::RemoveEntry => EntryOutcome::Removed,
            LocalMissingDecision::UnlinkRemote => {
                entry.unlink_remote();
                EntryOutcome::Unlinked
            }
            LocalMissingDecision::Skip => EntryOutcome::LocalMissing,
            LocalMissingDecision::Abort => EntryOutcome::Aborted,
        }
    }

    fn remote_missing(
        &self,
        entry: &mut DocumentEntry,
        issue: RemoteIssue,
        text: &str,
        hash: &str,
        policy: &mut dyn ResolutionPolicy,
    ) -> EntryOutcome {
        warn!(
            path = %entry.local_path,
            id = entry.remote_id().unwrap_or_default(),
            ?issue,
            "Remote document is no longer accessible"
        );
        entry.status = issue.status();

        let decision = if self.ctx.force_recreate {
            RemoteMissingDecision::CreateNew
        } else {
            policy.on_remote_missing(entry, issue)
        };
        match decision {
            RemoteMissingDecision::CreateNew => {
                entry.unlink_remote();
                self.create_and_push(entry, text, hash)
            }
            RemoteMissingDecision::Unlink => {
                entry.unlink_remote();
                EntryOutcome::Unlinked
            }
            RemoteMissingDecision::Skip => EntryOutcome::Skipped,
            RemoteMissingDecision::Abort => EntryOutcome::Aborted,
        }
    }
}
