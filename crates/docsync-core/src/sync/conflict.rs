//! Resolution of entries changed on both sides

use chrono::Utc;
use docsync_fs::{compute_content_checksum, io};
use tracing::{info, warn};

use super::context::SyncContext;
use super::policy::{ResolutionDecision, ResolutionPolicy};
use super::reconcile::{EntryOutcome, ReconcileEngine};
use crate::content;
use crate::registry::{DocStatus, DocumentEntry};
use crate::remote::{RemoteAccessor, RemoteMetadata};

/// Applies the policy's decision for a conflicted entry.
pub struct ConflictResolver<'a> {
    remote: &'a dyn RemoteAccessor,
    ctx: &'a SyncContext,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(remote: &'a dyn RemoteAccessor, ctx: &'a SyncContext) -> Self {
        Self { remote, ctx }
    }

    /// Resolve a conflict between `local_text` and the `live` remote.
    ///
    /// `Skip` and `Abort` leave the local file and the stored snapshot
    /// untouched with status `conflict`.
    pub fn resolve(
        &self,
        entry: &mut DocumentEntry,
        local_text: &str,
        local_hash: &str,
        live: &RemoteMetadata,
        policy: &mut dyn ResolutionPolicy,
    ) -> EntryOutcome {
        warn!(
            path = %entry.local_path,
            stored = entry.remote_version.as_deref().unwrap_or_default(),
            live = %live.version,
            "Local and remote both changed since last sync"
        );
        entry.status = DocStatus::Conflict;

        match policy.on_conflict(entry, live) {
            ResolutionDecision::PushLocal => ReconcileEngine::new(self.remote, self.ctx)
                .push(entry, &live.id, local_text, local_hash),
            ResolutionDecision::PullRemote => self.pull(entry, live),
            ResolutionDecision::Skip => EntryOutcome::Conflict,
            ResolutionDecision::Abort => EntryOutcome::Aborted,
        }
    }

    /// Replace the local file with the remote text.
    fn pull(&self, entry: &mut DocumentEntry, live: &RemoteMetadata) -> EntryOutcome {
        let exported = match self.remote.export_as_text(&live.id) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %entry.local_path, error = %err, "Export failed");
                entry.status = DocStatus::SyncFailed;
                return EntryOutcome::Failed(err.to_string());
            }
        };
        let text = content::prepare(&exported, self.ctx.clean_content);

        let path = self.ctx.local_path(&entry.local_path);
        if let Err(err) = io::write_text(&path, &text) {
            warn!(path = %entry.local_path, error = %err, "Could not write pulled text");
            entry.status = DocStatus::SyncFailed;
            return EntryOutcome::Failed(err.to_string());
        }

        let now = Utc::now();
        entry.local_content_hash = Some(compute_content_checksum(&text));
        entry.remote_version = Some(live.version.clone());
        entry.last_synced_at = Some(now);
        entry.remote_last_known_good_at = Some(live.modified_time.unwrap_or(now));
        entry.status = DocStatus::Active;
        info!(path = %entry.local_path, id = %live.id, "Pulled remote changes");
        EntryOutcome::Pulled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{InMemoryRemote, RemoteError, RemoteOp};
    use crate::sync::policy::NonInteractivePolicy;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SyncContext, InMemoryRemote, DocumentEntry, RemoteMetadata) {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        std::fs::write(ctx.local_path("a.md"), "local edit").unwrap();

        let remote = InMemoryRemote::new();
        let v0 = remote.insert_document("doc-a", "base");
        remote.edit_externally("doc-a", r"remote \*edit\*");

        let mut entry = DocumentEntry::new("a.md", Utc::now());
        entry.local_content_hash = Some(compute_content_checksum("base"));
        entry.remote_doc_id = Some("doc-a".into());
        entry.remote_version = Some(v0);

        let live = remote.get_metadata("doc-a").unwrap();
        remote.clear_calls();
        (temp, ctx, remote, entry, live)
    }

    type Resolved = (EntryOutcome, DocumentEntry, SyncContext, InMemoryRemote, TempDir);

    fn resolve_with(decision: ResolutionDecision) -> Resolved {
        let (temp, ctx, remote, mut entry, live) = setup();
        let mut policy = NonInteractivePolicy {
            conflict: decision,
            ..Default::default()
        };
        let hash = compute_content_checksum("local edit");
        let outcome = ConflictResolver::new(&remote, &ctx).resolve(
            &mut entry,
            "local edit",
            &hash,
            &live,
            &mut policy,
        );
        (outcome, entry, ctx, remote, temp)
    }

    #[test]
    fn skip_leaves_everything_alone() {
        let (_, _, _, before, _) = setup();
        let (outcome, entry, ctx, remote, _temp) = resolve_with(ResolutionDecision::Skip);

        assert_eq!(outcome, EntryOutcome::Conflict);
        assert_eq!(entry.status, DocStatus::Conflict);
        assert_eq!(entry.local_content_hash, before.local_content_hash);
        assert_eq!(entry.remote_version, before.remote_version);
        assert_eq!(
            std::fs::read_to_string(ctx.local_path("a.md")).unwrap(),
            "local edit"
        );
        assert!(remote.calls().is_empty());
    }

    #[test]
    fn push_local_overwrites_remote() {
        let (outcome, entry, _ctx, remote, _temp) = resolve_with(ResolutionDecision::PushLocal);

        assert_eq!(outcome, EntryOutcome::Pushed);
        assert_eq!(remote.text("doc-a").as_deref(), Some("local edit"));
        assert_eq!(entry.remote_version, remote.version("doc-a"));
        assert_eq!(
            entry.local_content_hash,
            Some(compute_content_checksum("local edit"))
        );
    }

    #[test]
    fn pull_remote_overwrites_local_with_cleaned_text() {
        let (outcome, entry, ctx, remote, _temp) = resolve_with(ResolutionDecision::PullRemote);

        assert_eq!(outcome, EntryOutcome::Pulled);
        let text = std::fs::read_to_string(ctx.local_path("a.md")).unwrap();
        assert_eq!(text, "remote *edit*");
        assert_eq!(entry.local_content_hash, Some(compute_content_checksum(&text)));
        assert_eq!(entry.remote_version, remote.version("doc-a"));
        assert_eq!(entry.status, DocStatus::Active);
        assert_eq!(remote.write_count(), 0);
    }

    #[test]
    fn abort_keeps_conflict_status() {
        let (outcome, entry, ..) = resolve_with(ResolutionDecision::Abort);
        assert_eq!(outcome, EntryOutcome::Aborted);
        assert_eq!(entry.status, DocStatus::Conflict);
    }

    #[test]
    fn failed_export_leaves_local_file() {
        let (_temp, ctx, remote, mut entry, live) = setup();
        remote.fail_next(
            RemoteOp::ExportAsText,
            RemoteError::Rejected {
                message: "no export".into(),
            },
        );
        let mut policy = NonInteractivePolicy {
            conflict: ResolutionDecision::PullRemote,
            ..Default::default()
        };
        let before = entry.clone();

        let outcome = ConflictResolver::new(&remote, &ctx).resolve(
            &mut entry,
            "local edit",
            "h",
            &live,
            &mut policy,
        );

        assert!(matches!(outcome, EntryOutcome::Failed(_)));
        assert_eq!(entry.local_content_hash, before.local_content_hash);
        assert_eq!(
            std::fs::read_to_string(ctx.local_path("a.md")).unwrap(),
            "local edit"
        );
    }
}
