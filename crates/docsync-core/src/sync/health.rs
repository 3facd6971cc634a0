//! Health checking and metadata repair
//!
//! Runs the same observations as a sync pass but never transfers content
//! or creates remote documents. Statuses are brought up to date; in repair
//! mode the operator can additionally correct metadata (unlink, remove,
//! adopt the live hash or version).

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use super::context::SyncContext;
use super::policy::{LocalMissingDecision, RemoteIssue, RemoteMissingDecision, ResolutionPolicy};
use super::inspect::{self, LocalState, RemoteState};
use crate::registry::{DocStatus, DocumentEntry, Registry};
use crate::remote::RemoteAccessor;

/// Observed condition of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthState {
    Synced,
    /// No remote document linked.
    Unlinked,
    LocalChanged,
    RemoteChanged,
    Conflict,
    LocalMissing,
    RemoteInaccessible(RemoteIssue),
    /// The local file exists but could not be read.
    LocalUnreadable(String),
    /// The remote check failed after retries.
    RemoteCheckFailed(String),
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthState::Synced => f.write_str("in sync"),
            HealthState::Unlinked => f.write_str("no remote document"),
            HealthState::LocalChanged => f.write_str("local changes not pushed"),
            HealthState::RemoteChanged => f.write_str("remote changed since last sync"),
            HealthState::Conflict => f.write_str("changed on both sides"),
            HealthState::LocalMissing => f.write_str("local file missing"),
            HealthState::RemoteInaccessible(RemoteIssue::NotFound) => {
                f.write_str("remote document not found")
            }
            HealthState::RemoteInaccessible(RemoteIssue::Trashed) => {
                f.write_str("remote document trashed")
            }
            HealthState::LocalUnreadable(reason) => write!(f, "local file unreadable: {reason}"),
            HealthState::RemoteCheckFailed(reason) => write!(f, "remote check failed: {reason}"),
        }
    }
}

/// A metadata correction made in repair mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairAction {
    Removed,
    Unlinked,
    /// Link dropped and status reset so the next sync creates a document.
    MarkedForCreation,
    AdoptedHash,
    AdoptedVersion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthFinding {
    pub path: String,
    pub state: HealthState,
    /// Status after the check (and any repair).
    pub status: DocStatus,
    pub repairs: Vec<RepairAction>,
}

/// Aggregate counts over all checked entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCounts {
    pub total: usize,
    pub synced: usize,
    pub unlinked: usize,
    pub local_changed: usize,
    pub remote_changed: usize,
    pub conflict: usize,
    pub local_missing: usize,
    pub remote_inaccessible: usize,
    /// Entries left in an error status or that could not be checked.
    pub errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub findings: Vec<HealthFinding>,
    pub counts: HealthCounts,
    pub by_status: BTreeMap<DocStatus, usize>,
    pub aborted: bool,
}

impl HealthReport {
    /// No errors, missing files, or inaccessible remotes remain.
    pub fn is_healthy(&self) -> bool {
        !self.aborted
            && self.counts.errors == 0
            && self.counts.local_missing == 0
            && self.counts.remote_inaccessible == 0
    }

    fn record(&mut self, finding: HealthFinding) {
        let counts = &mut self.counts;
        counts.total += 1;
        if finding.repairs.contains(&RepairAction::Removed) {
            self.findings.push(finding);
            return;
        }
        match &finding.state {
            HealthState::Synced => counts.synced += 1,
            HealthState::Unlinked => counts.unlinked += 1,
            HealthState::LocalChanged => counts.local_changed += 1,
            HealthState::RemoteChanged => counts.remote_changed += 1,
            HealthState::Conflict => counts.conflict += 1,
            HealthState::LocalMissing => counts.local_missing += 1,
            HealthState::RemoteInaccessible(_) => counts.remote_inaccessible += 1,
            HealthState::LocalUnreadable(_) | HealthState::RemoteCheckFailed(_) => {}
        }
        let unchecked = matches!(
            finding.state,
            HealthState::LocalUnreadable(_) | HealthState::RemoteCheckFailed(_)
        );
        if unchecked || finding.status.is_error() {
            counts.errors += 1;
        }
        *self.by_status.entry(finding.status).or_default() += 1;
        self.findings.push(finding);
    }
}

/// Classifies registry entries without transferring content.
pub struct HealthChecker<'a> {
    remote: &'a dyn RemoteAccessor,
    ctx: &'a SyncContext,
}

enum Checked {
    Keep(HealthFinding),
    Remove(HealthFinding),
    Abort(HealthFinding),
}

impl<'a> HealthChecker<'a> {
    pub fn new(remote: &'a dyn RemoteAccessor, ctx: &'a SyncContext) -> Self {
        Self { remote, ctx }
    }

    /// Classify every entry and refresh its status.
    pub fn check(&self, registry: &mut Registry) -> HealthReport {
        self.run(registry, None)
    }

    /// Classify every entry and offer metadata repairs through `policy`.
    pub fn repair(&self, registry: &mut Registry, policy: &mut dyn ResolutionPolicy) -> HealthReport {
        self.run(registry, Some(policy))
    }

    fn run(
        &self,
        registry: &mut Registry,
        mut policy: Option<&mut dyn ResolutionPolicy>,
    ) -> HealthReport {
        let mut report = HealthReport::default();
        for path in registry.paths() {
            let Some(entry) = registry.get_mut(&path) else {
                continue;
            };
            let entry_policy: Option<&mut dyn ResolutionPolicy> = match policy {
                Some(ref mut p) => Some(&mut **p),
                None => None,
            };
            match self.check_entry(entry, entry_policy) {
                Checked::Keep(finding) => report.record(finding),
                Checked::Remove(finding) => {
                    info!(path = %path, "Unregistered entry during repair");
                    registry.entries.remove(&path);
                    report.record(finding);
                }
                Checked::Abort(finding) => {
                    report.record(finding);
                    report.aborted = true;
                    warn!("Health repair aborted by operator");
                    break;
                }
            }
        }
        report
    }

    fn check_entry(
        &self,
        entry: &mut DocumentEntry,
        policy: Option<&mut dyn ResolutionPolicy>,
    ) -> Checked {
        let mut finding = HealthFinding {
            path: entry.local_path.clone(),
            state: HealthState::Synced,
            status: entry.status,
            repairs: Vec::new(),
        };

        let hash = match inspect::read_local(&self.ctx.local_path(&entry.local_path)) {
            Ok(LocalState::Present { hash, .. }) => hash,
            Ok(LocalState::Missing) => {
                entry.status = DocStatus::ErrorLocalMissing;
                finding.state = HealthState::LocalMissing;
                return self.repair_local_missing(entry, finding, policy);
            }
            Err(err) => {
                warn!(path = %entry.local_path, error = %err, "Cannot read local file");
                entry.status = DocStatus::SyncFailed;
                finding.state = HealthState::LocalUnreadable(err.to_string());
                finding.status = entry.status;
                return Checked::Keep(finding);
            }
        };

        let live = match inspect::inspect_remote(self.remote, entry) {
            RemoteState::Live(meta) => meta,
            RemoteState::Unlinked => {
                finding.state = HealthState::Unlinked;
                if !matches!(
                    entry.status,
                    DocStatus::New
                        | DocStatus::LocalOnly
                        | DocStatus::CreationFailed
                        | DocStatus::ErrorRemoteNotFound
                        | DocStatus::ErrorRemoteTrashed
                ) {
                    entry.status = DocStatus::LocalOnly;
                }
                if entry.status.is_remote_error()
                    && let Some(policy) = policy
                {
                    let issue = match entry.status {
                        DocStatus::ErrorRemoteTrashed => RemoteIssue::Trashed,
                        _ => RemoteIssue::NotFound,
                    };
                    return self.repair_remote_missing(entry, issue, finding, policy);
                }
                finding.status = entry.status;
                return Checked::Keep(finding);
            }
            RemoteState::Inaccessible(issue) => {
                warn!(path = %entry.local_path, ?issue, "Remote document is inaccessible");
                entry.status = issue.status();
                finding.state = HealthState::RemoteInaccessible(issue);
                return match policy {
                    Some(policy) => self.repair_remote_missing(entry, issue, finding, policy),
                    None => {
                        finding.status = entry.status;
                        Checked::Keep(finding)
                    }
                };
            }
            RemoteState::Failed(err) => {
                warn!(path = %entry.local_path, error = %err, "Remote check failed");
                entry.status = DocStatus::SyncFailed;
                finding.state = HealthState::RemoteCheckFailed(err.to_string());
                finding.status = entry.status;
                return Checked::Keep(finding);
            }
        };

        let mut local_changed = inspect::local_changed(entry, &hash);
        let mut remote_changed = inspect::remote_changed(entry, &live);

        if let Some(policy) = policy {
            if local_changed && policy.adopt_local_hash(entry, &hash) {
                entry.local_content_hash = Some(hash.clone());
                finding.repairs.push(RepairAction::AdoptedHash);
                local_changed = false;
            }
            if remote_changed && policy.adopt_remote_version(entry, &live) {
                entry.remote_version = Some(live.version.clone());
                if live.modified_time.is_some() {
                    entry.remote_last_known_good_at = live.modified_time;
                }
                finding.repairs.push(RepairAction::AdoptedVersion);
                remote_changed = false;
            }
        }

        let (state, status) = match (local_changed, remote_changed) {
            (false, false) => (HealthState::Synced, DocStatus::Active),
            (true, false) => (HealthState::LocalChanged, DocStatus::LocalChanged),
            (false, true) => (HealthState::RemoteChanged, DocStatus::RemoteChanged),
            (true, true) => (HealthState::Conflict, DocStatus::Conflict),
        };
        debug!(path = %entry.local_path, %state, "Checked entry");
        entry.status = status;
        finding.state = state;
        finding.status = status;
        Checked::Keep(finding)
    }

    fn repair_local_missing(
        &self,
        entry: &mut DocumentEntry,
        mut finding: HealthFinding,
        policy: Option<&mut dyn ResolutionPolicy>,
    ) -> Checked {
        finding.status = entry.status;
        let Some(policy) = policy else {
            return Checked::Keep(finding);
        };
        match policy.on_local_missing(entry) {
            LocalMissingDecision::RemoveEntry => {
                finding.repairs.push(RepairAction::Removed);
                Checked::Remove(finding)
            }
            LocalMissingDecision::UnlinkRemote => {
                entry.unlink_remote();
                finding.repairs.push(RepairAction::Unlinked);
                Checked::Keep(finding)
            }
            LocalMissingDecision::Skip => Checked::Keep(finding),
            LocalMissingDecision::Abort => Checked::Abort(finding),
        }
    }

    fn repair_remote_missing(
        &self,
        entry: &mut DocumentEntry,
        issue: RemoteIssue,
        mut finding: HealthFinding,
        policy: &mut dyn ResolutionPolicy,
    ) -> Checked {
        let outcome: fn(HealthFinding) -> Checked = match policy.on_remote_missing(entry, issue) {
            RemoteMissingDecision::CreateNew => {
                entry.unlink_remote();
                entry.status = DocStatus::New;
                finding.repairs.push(RepairAction::MarkedForCreation);
                Checked::Keep
            }
            RemoteMissingDecision::Unlink => {
                if entry.has_remote() {
                    entry.unlink_remote();
                    finding.repairs.push(RepairAction::Unlinked);
                }
                Checked::Keep
            }
            RemoteMissingDecision::Skip => Checked::Keep,
            RemoteMissingDecision::Abort => Checked::Abort,
        };
        finding.status = entry.status;
        outcome(finding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{InMemoryRemote, RemoteError, RemoteOp};
    use crate::sync::policy::NonInteractivePolicy;
    use chrono::Utc;
    use docsync_fs::compute_content_checksum;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn linked(key: &str, text: &str, version: String) -> DocumentEntry {
        let mut entry = DocumentEntry::new(key, Utc::now());
        entry.local_content_hash = Some(compute_content_checksum(text));
        entry.remote_doc_id = Some(format!("doc-{key}"));
        entry.remote_version = Some(version);
        entry.status = DocStatus::Active;
        entry
    }

    #[test]
    fn classifies_every_state_without_writes() {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        let remote = InMemoryRemote::new();
        let mut registry = Registry::default();

        for key in ["same", "local", "remote", "both"] {
            std::fs::write(ctx.local_path(key), "base").unwrap();
            let version = remote.insert_document(&format!("doc-{key}"), "base");
            registry.insert(linked(key, "base", version));
        }
        std::fs::write(ctx.local_path("local"), "edited").unwrap();
        std::fs::write(ctx.local_path("both"), "edited").unwrap();
        remote.edit_externally("doc-remote", "edited");
        remote.edit_externally("doc-both", "edited");

        let before_file = std::fs::read_to_string(ctx.local_path("both")).unwrap();
        let report = HealthChecker::new(&remote, &ctx).check(&mut registry);

        assert_eq!(report.counts.total, 4);
        assert_eq!(report.counts.synced, 1);
        assert_eq!(report.counts.local_changed, 1);
        assert_eq!(report.counts.remote_changed, 1);
        assert_eq!(report.counts.conflict, 1);
        assert!(report.is_healthy());
        assert_eq!(registry.get("both").unwrap().status, DocStatus::Conflict);
        assert_eq!(remote.write_count(), 0);
        assert_eq!(
            std::fs::read_to_string(ctx.local_path("both")).unwrap(),
            before_file
        );
    }

    #[test]
    fn missing_local_file_is_unhealthy() {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        let remote = InMemoryRemote::new();
        let mut registry = Registry::default();
        registry.insert(DocumentEntry::new("gone.md", Utc::now()));

        let report = HealthChecker::new(&remote, &ctx).check(&mut registry);

        assert_eq!(report.counts.local_missing, 1);
        assert!(!report.is_healthy());
        assert!(registry.contains("gone.md"));
    }

    #[test]
    fn repair_adopts_remote_version() {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        let remote = InMemoryRemote::new();
        std::fs::write(ctx.local_path("a"), "base").unwrap();
        let v0 = remote.insert_document("doc-a", "base");
        let v1 = remote.edit_externally("doc-a", "changed").unwrap();
        let mut registry = Registry::default();
        registry.insert(linked("a", "base", v0));

        let mut policy = NonInteractivePolicy {
            adopt_version: true,
            ..Default::default()
        };
        let report = HealthChecker::new(&remote, &ctx).repair(&mut registry, &mut policy);

        let entry = registry.get("a").unwrap();
        assert_eq!(entry.remote_version.as_deref(), Some(v1.as_str()));
        assert_eq!(entry.status, DocStatus::Active);
        assert_eq!(report.findings[0].repairs, vec![RepairAction::AdoptedVersion]);
        assert_eq!(remote.write_count(), 0);
    }

    #[test]
    fn repair_removes_entry_on_request() {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        let remote = InMemoryRemote::new();
        let mut registry = Registry::default();
        registry.insert(DocumentEntry::new("gone.md", Utc::now()));

        let mut policy = NonInteractivePolicy {
            local_missing: LocalMissingDecision::RemoveEntry,
            ..Default::default()
        };
        let report = HealthChecker::new(&remote, &ctx).repair(&mut registry, &mut policy);

        assert!(registry.is_empty());
        assert!(report.is_healthy());
        assert_eq!(report.findings[0].repairs, vec![RepairAction::Removed]);
    }

    #[test]
    fn repair_marks_unlinked_entry_for_creation() {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        let remote = InMemoryRemote::new();
        std::fs::write(ctx.local_path("a"), "base").unwrap();
        let mut entry = DocumentEntry::new("a", Utc::now());
        entry.status = DocStatus::ErrorRemoteNotFound;
        let mut registry = Registry::default();
        registry.insert(entry);

        let mut policy = NonInteractivePolicy {
            remote_missing: RemoteMissingDecision::CreateNew,
            ..Default::default()
        };
        let report = HealthChecker::new(&remote, &ctx).repair(&mut registry, &mut policy);

        assert_eq!(registry.get("a").unwrap().status, DocStatus::New);
        assert!(report.is_healthy());
        assert_eq!(remote.write_count(), 0);
    }

    #[test]
    fn repair_visits_every_entry() {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        let remote = InMemoryRemote::new();
        let mut registry = Registry::default();
        for key in ["a.md", "b.md", "c.md"] {
            registry.insert(DocumentEntry::new(key, Utc::now()));
        }

        let mut policy = NonInteractivePolicy {
            local_missing: LocalMissingDecision::RemoveEntry,
            ..Default::default()
        };
        let report = HealthChecker::new(&remote, &ctx).repair(&mut registry, &mut policy);

        assert!(registry.is_empty());
        assert_eq!(report.findings.len(), 3);
        assert_eq!(report.counts.total, 3);
    }

    #[test]
    fn failed_remote_check_marks_sync_failed() {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        let remote = InMemoryRemote::new();
        std::fs::write(ctx.local_path("a"), "base").unwrap();
        let version = remote.insert_document("doc-a", "base");
        let mut registry = Registry::default();
        registry.insert(linked("a", "base", version));
        remote.fail_next(
            RemoteOp::GetMetadata,
            RemoteError::Rejected {
                message: "denied".into(),
            },
        );

        let report = HealthChecker::new(&remote, &ctx).check(&mut registry);

        assert!(matches!(report.findings[0].state, HealthState::RemoteCheckFailed(_)));
        assert_eq!(report.findings[0].status, DocStatus::SyncFailed);
        assert_eq!(registry.get("a").unwrap().status, DocStatus::SyncFailed);
        assert_eq!(report.counts.errors, 1);
        assert!(!report.is_healthy());
    }

    #[test]
    fn unreadable_local_file_marks_sync_failed() {
        let temp = TempDir::new().unwrap();
        let ctx = SyncContext::new(temp.path());
        let remote = InMemoryRemote::new();
        std::fs::create_dir_all(ctx.local_path("a")).unwrap();
        let version = remote.insert_document("doc-a", "base");
        let mut registry = Registry::default();
        registry.insert(linked("a", "base", version));

        let report = HealthChecker::new(&remote, &ctx).check(&mut registry);

        assert!(matches!(
            report.findings[0].state,
            HealthState::LocalUnreadable(_)
        ));
        assert_eq!(report.findings[0].status, DocStatus::SyncFailed);
        assert_eq!(registry.get("a").unwrap().status, DocStatus::SyncFailed);
        assert!(!report.is_healthy());
    }
}
