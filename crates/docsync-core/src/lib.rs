//! Document registry and reconciliation engine for docsync
//!
//! Keeps local text documents in step with counterparts on a remote
//! document service:
//!
//! - **Registry**: versioned, forward-compatible record of tracked documents
//! - **Remote boundary**: the [`RemoteAccessor`] trait plus a retry wrapper
//! - **Sync**: per-entry reconciliation, conflict resolution, health checks,
//!   and whole-pass orchestration
//!
//! # Architecture
//!
//! ```text
//!                docsync-cli
//!                     |
//!               docsync-core
//!        +--------+---+------+--------+
//!        |        |          |        |
//!    registry   remote     sync    config
//!        |                   |
//!        +---- docsync-fs ---+
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod registry;
pub mod remote;
pub mod sync;

pub use config::{Manifest, find_project_root};
pub use error::{Error, Result};
pub use registry::{
    DocStatus, DocumentEntry, EntryPatch, ImportReport, InteractionMode, LoadStatus, Registry,
    RegistryStore, TargetFolder, import_mapping,
};
pub use remote::{
    CreatedDocument, DirectoryRemote, InMemoryRemote, RemoteAccessor, RemoteError,
    RemoteMetadata, RemoteResult, RemoteRevision, RetryPolicy, RetryingRemote,
};
pub use sync::{
    EntryOutcome, HealthChecker, HealthReport, NonInteractivePolicy, ReconcileEngine,
    ResolutionDecision, ResolutionPolicy, SyncContext, SyncOrchestrator, SyncReport,
};
