//! Error types for docsync-core

use std::path::PathBuf;

use crate::remote::RemoteError;

/// Result type for docsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in docsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The path has no registry entry
    #[error("Document not tracked: {path}")]
    NotTracked { path: String },

    /// Registry file could not be parsed.
    ///
    /// The store recovers from this by reinitializing; it only escapes
    /// through [`crate::registry::RegistryStore::parse`].
    #[error("Registry at {path} is corrupt: {message}")]
    RegistryCorrupt { path: PathBuf, message: String },

    /// The legacy mapping file has an unexpected shape
    #[error("Invalid import mapping: {message}")]
    InvalidMapping { message: String },

    /// Terminal remote failure (retries already exhausted)
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Filesystem error from docsync-fs
    #[error(transparent)]
    Fs(#[from] docsync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}
