//! Filesystem layer for docsync
//!
//! Provides project-relative path handling, the content hasher used for
//! change detection, and atomic write-temp-then-rename I/O.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{compute_content_checksum, compute_file_checksum};
pub use error::{Error, Result};
pub use path::{NormalizedPath, relative_key};
