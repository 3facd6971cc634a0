//! Remote document service boundary
//!
//! The reconciliation engine only ever talks to the remote service through
//! [`RemoteAccessor`]. Authentication and transport live in the concrete
//! implementation; this crate ships a directory-backed accessor, an
//! in-memory one for tests, and a retry wrapper usable with either.

mod directory;
mod memory;
mod retry;

pub use directory::DirectoryRemote;
pub use memory::{InMemoryRemote, RemoteCall, RemoteOp};
pub use retry::{RetryPolicy, RetryingRemote};

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result type for remote accessor calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Failure categories a remote accessor may report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote document {id} not found")]
    NotFound { id: String },

    #[error("Remote document {id} is in the trash")]
    Trashed { id: String },

    #[error("Remote service rate limited the request")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Remote service error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Remote transport error: {message}")]
    Transport { message: String },

    /// A request the service refused outright (bad input, permissions).
    #[error("Remote service rejected the request: {message}")]
    Rejected { message: String },
}

impl RemoteError {
    /// Transient failures are retried with backoff before being surfaced.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Transport { .. }
        )
    }
}

/// Metadata snapshot of a remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMetadata {
    pub id: String,
    pub trashed: bool,
    /// Opaque revision token; compared for equality only.
    pub version: String,
    pub modified_time: Option<DateTime<Utc>>,
}

/// Result of a successful content write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRevision {
    pub version: String,
    pub modified_time: Option<DateTime<Utc>>,
}

/// Result of creating a new remote document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDocument {
    pub id: String,
    pub version: String,
    pub modified_time: Option<DateTime<Utc>>,
}

/// Capability interface for the remote document service.
///
/// Implementations report `NotFound`/`Trashed` for inaccessible documents
/// and one of the transient categories for rate limiting and server faults.
/// `get_metadata` may alternatively return `trashed: true`.
pub trait RemoteAccessor: Send + Sync {
    /// Fetch the current metadata of a document.
    fn get_metadata(&self, id: &str) -> RemoteResult<RemoteMetadata>;

    /// Create an empty document, optionally inside a folder.
    fn create(&self, title: &str, folder_id: Option<&str>) -> RemoteResult<CreatedDocument>;

    /// Replace the full text of a document.
    fn replace_content(&self, id: &str, text: &str) -> RemoteResult<RemoteRevision>;

    /// Export the document as plain text.
    fn export_as_text(&self, id: &str) -> RemoteResult<String>;
}

impl<T: RemoteAccessor + ?Sized> RemoteAccessor for &T {
    fn get_metadata(&self, id: &str) -> RemoteResult<RemoteMetadata> {
        (**self).get_metadata(id)
    }

    fn create(&self, title: &str, folder_id: Option<&str>) -> RemoteResult<CreatedDocument> {
        (**self).create(title, folder_id)
    }

    fn replace_content(&self, id: &str, text: &str) -> RemoteResult<RemoteRevision> {
        (**self).replace_content(id, text)
    }

    fn export_as_text(&self, id: &str) -> RemoteResult<String> {
        (**self).export_as_text(id)
    }
}

impl<T: RemoteAccessor + ?Sized> RemoteAccessor for Box<T> {
    fn get_metadata(&self, id: &str) -> RemoteResult<RemoteMetadata> {
        (**self).get_metadata(id)
    }

    fn create(&self, title: &str, folder_id: Option<&str>) -> RemoteResult<CreatedDocument> {
        (**self).create(title, folder_id)
    }

    fn replace_content(&self, id: &str, text: &str) -> RemoteResult<RemoteRevision> {
        (**self).replace_content(id, text)
    }

    fn export_as_text(&self, id: &str) -> RemoteResult<String> {
        (**self).export_as_text(id)
    }
}
