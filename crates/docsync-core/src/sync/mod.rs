//! Reconciliation of tracked documents
//!
//! - [`ReconcileEngine`]: classifies one entry and acts on it
//! - [`ConflictResolver`]: applies the operator's choice when both sides changed
//! - [`HealthChecker`]: read-only classification with optional metadata repair
//! - [`SyncOrchestrator`]: whole passes with a single registry save
//!
//! All operator choices come from a [`ResolutionPolicy`]; all run settings
//! from a [`SyncContext`].

mod conflict;
mod context;
mod health;
mod inspect;
mod orchestrator;
mod policy;
mod reconcile;

pub use conflict::ConflictResolver;
pub use context::SyncContext;
pub use health::{
    HealthChecker, HealthCounts, HealthFinding, HealthReport, HealthState, RepairAction,
};
pub use orchestrator::{CheckRun, SyncCounts, SyncOrchestrator, SyncReport, SyncRun};
pub use policy::{
    LocalMissingDecision, NonInteractivePolicy, RemoteIssue, RemoteMissingDecision,
    ResolutionDecision, ResolutionPolicy,
};
pub use reconcile::{EntryOutcome, ReconcileEngine};
