//! Full sync and health passes over a registry
//!
//! The orchestrator loads the registry once, resolves the target folder,
//! reconciles entries in key order, and persists once at the end. Nothing
//! is written when the pass changed nothing, so idle passes leave the
//! registry file byte-identical.

use tracing::{debug, info, warn};

use super::context::SyncContext;
use super::health::{HealthChecker, HealthReport};
use super::policy::ResolutionPolicy;
use super::reconcile::{EntryOutcome, ReconcileEngine};
use crate::Result;
use crate::registry::{DocStatus, LoadStatus, Registry, RegistryStore, TargetFolder};
use crate::remote::RemoteAccessor;

/// Tally of entry outcomes for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub unchanged: usize,
    pub pushed: usize,
    pub created: usize,
    pub pulled: usize,
    pub remote_changed: usize,
    pub conflicts: usize,
    pub skipped: usize,
    pub removed: usize,
    pub unlinked: usize,
    pub local_missing: usize,
    pub failed: usize,
}

impl SyncCounts {
    fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Unchanged => self.unchanged += 1,
            EntryOutcome::Pushed => self.pushed += 1,
            EntryOutcome::Created => self.created += 1,
            EntryOutcome::Pulled => self.pulled += 1,
            EntryOutcome::RemoteChanged => self.remote_changed += 1,
            EntryOutcome::Conflict => self.conflicts += 1,
            EntryOutcome::Skipped | EntryOutcome::Aborted => self.skipped += 1,
            EntryOutcome::Removed => self.removed += 1,
            EntryOutcome::Unlinked => self.unlinked += 1,
            EntryOutcome::LocalMissing => self.local_missing += 1,
            EntryOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Entries that ended the pass in sync.
    pub fn synced(&self) -> usize {
        self.unchanged + self.pushed + self.created + self.pulled
    }
}

/// Result of a sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Outcome per processed entry, in processing order.
    pub outcomes: Vec<(String, EntryOutcome)>,
    pub counts: SyncCounts,
    /// Processed entries left needing attention, with their final status.
    pub unresolved: Vec<(String, DocStatus)>,
    pub target_folder: Option<TargetFolder>,
    pub aborted: bool,
    /// Whether the registry was written.
    pub saved: bool,
}

impl SyncReport {
    /// True when the run should exit non-zero.
    pub fn has_unresolved(&self) -> bool {
        self.aborted || !self.unresolved.is_empty()
    }
}

/// Outcome of a health pass plus persistence details.
#[derive(Debug, Clone)]
pub struct CheckRun {
    pub report: HealthReport,
    pub load_status: LoadStatus,
    pub saved: bool,
}

/// Outcome of a sync pass plus persistence details.
#[derive(Debug, Clone)]
pub struct SyncRun {
    pub report: SyncReport,
    pub load_status: LoadStatus,
}

/// Drives whole passes against one registry file.
pub struct SyncOrchestrator<'a> {
    remote: &'a dyn RemoteAccessor,
    store: RegistryStore,
    ctx: SyncContext,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(remote: &'a dyn RemoteAccessor, store: RegistryStore, ctx: SyncContext) -> Self {
        Self { remote, store, ctx }
    }

    pub fn context(&self) -> &SyncContext {
        &self.ctx
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    /// Load, reconcile every entry, and save if anything changed.
    pub fn sync(&self, policy: &mut dyn ResolutionPolicy) -> Result<SyncRun> {
        let (mut registry, load_status) = self.store.load_with_status()?;
        let before = registry.clone();

        let mut report = self.sync_registry(&mut registry, policy);

        if registry_changed(&before, &registry) || was_migrated(&load_status) {
            self.store.save(&mut registry)?;
            report.saved = true;
        } else {
            debug!("Registry unchanged, not saving");
        }
        Ok(SyncRun {
            report,
            load_status,
        })
    }

    /// Reconcile every entry of an in-memory registry.
    ///
    /// Stops at the first operator abort; entries already processed keep
    /// their results.
    pub fn sync_registry(
        &self,
        registry: &mut Registry,
        policy: &mut dyn ResolutionPolicy,
    ) -> SyncReport {
        let mut report = SyncReport {
            target_folder: self.resolve_target_folder(registry, policy),
            ..Default::default()
        };
        let ctx = SyncContext {
            target_folder: report.target_folder.clone(),
            ..self.ctx.clone()
        };
        let engine = ReconcileEngine::new(self.remote, &ctx);

        for path in registry.paths() {
            let Some(entry) = registry.get_mut(&path) else {
                continue;
            };
            let outcome = engine.reconcile(entry, policy);
            let status = entry.status;
            debug!(path = %path, %outcome, %status, "Reconciled entry");

            if outcome == EntryOutcome::Removed {
                registry.entries.remove(&path);
                info!(path = %path, "Unregistered entry");
            } else if is_unresolved(status) {
                report.unresolved.push((path.clone(), status));
            }

            report.counts.record(&outcome);
            let aborted = outcome == EntryOutcome::Aborted;
            report.outcomes.push((path, outcome));
            if aborted {
                warn!("Sync aborted by operator; keeping results so far");
                report.aborted = true;
                break;
            }
        }

        info!(
            synced = report.counts.synced(),
            failed = report.counts.failed,
            conflicts = report.counts.conflicts,
            "Sync pass complete"
        );
        report
    }

    /// Load, classify (and optionally repair), and save if anything changed.
    pub fn check(
        &self,
        repair: Option<&mut dyn ResolutionPolicy>,
    ) -> Result<CheckRun> {
        let (mut registry, load_status) = self.store.load_with_status()?;
        let before = registry.clone();

        let checker = HealthChecker::new(self.remote, &self.ctx);
        let report = match repair {
            Some(policy) => checker.repair(&mut registry, policy),
            None => checker.check(&mut registry),
        };

        let saved = registry_changed(&before, &registry) || was_migrated(&load_status);
        if saved {
            self.store.save(&mut registry)?;
        }
        Ok(CheckRun {
            report,
            load_status,
            saved,
        })
    }

    /// Override > stored preference > policy choice > none.
    ///
    /// The policy is only consulted when some entry may need a new remote
    /// document, and its answer is stored as the preference.
    fn resolve_target_folder(
        &self,
        registry: &mut Registry,
        policy: &mut dyn ResolutionPolicy,
    ) -> Option<TargetFolder> {
        if let Some(folder) = self.ctx.target_folder.as_ref().filter(|f| f.is_set()) {
            debug!(id = %folder.id, "Using target folder override");
            return Some(folder.clone());
        }
        if let Some(folder) = registry.target_folder() {
            return Some(folder.clone());
        }

        let needs_folder = self.ctx.force_recreate
            || registry
                .iter()
                .any(|(_, e)| !e.has_remote() && !e.status.is_remote_error());
        if !needs_folder {
            return None;
        }

        let chosen = policy.choose_target_folder().filter(|f| f.is_set())?;
        info!(name = %chosen.name, id = %chosen.id, "Storing target folder preference");
        registry.set_target_folder(chosen.clone());
        Some(chosen)
    }
}

fn is_unresolved(status: DocStatus) -> bool {
    status.is_error() || status == DocStatus::Conflict
}

/// A migrated registry is rewritten once in the current schema.
fn was_migrated(status: &LoadStatus) -> bool {
    matches!(
        status,
        LoadStatus::Loaded {
            migrated_from: Some(_)
        }
    )
}

fn registry_changed(before: &Registry, after: &Registry) -> bool {
    before.entries != after.entries || before.sync_preferences != after.sync_preferences
}
