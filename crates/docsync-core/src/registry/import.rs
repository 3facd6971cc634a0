//! Import of legacy path-to-document mappings
//!
//! The older tooling kept a flat JSON object mapping file paths (relative
//! to the mapping file) to remote document ids. Keys starting with `_` are
//! comments, except `_google_drive_folder` which holds the folder preference.

use std::path::Path;

use docsync_fs::{compute_file_checksum, relative_key};
use serde_json::Value;
use tracing::{debug, warn};

use super::{DocStatus, EntryPatch, PENDING_CREATION, Registry, TargetFolder};
use crate::{Error, Result};

const FOLDER_KEY: &str = "_google_drive_folder";
const UNFILLED_ID: &str = "REPLACE_WITH_GOOGLE_DOC_ID";

/// What an import did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Registry keys created or updated.
    pub imported: Vec<String>,
    /// Mapping keys ignored, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Folder preference taken from the mapping.
    pub folder: Option<TargetFolder>,
}

/// Merge a legacy mapping into `registry`.
///
/// Mapping paths resolve against `base_dir`; anything outside `root` is
/// skipped. Existing entries are overlaid, never replaced, so fields the
/// mapping does not describe survive.
pub fn import_mapping(
    root: &Path,
    base_dir: &Path,
    registry: &mut Registry,
    mapping: &Value,
    source: &str,
) -> Result<ImportReport> {
    let Value::Object(pairs) = mapping else {
        return Err(Error::InvalidMapping {
            message: "expected a JSON object of path to document id".into(),
        });
    };

    let mut report = ImportReport::default();

    if let Some(Value::Object(folder)) = pairs.get(FOLDER_KEY) {
        let field = |k: &str| folder.get(k).and_then(Value::as_str).unwrap_or_default();
        let target = TargetFolder::new(field("name"), field("id"));
        if !target.id.is_empty() || !target.name.is_empty() {
            registry.set_target_folder(target.clone());
            report.folder = Some(target);
        }
    }

    for (raw_path, value) in pairs {
        if raw_path.starts_with('_') {
            continue;
        }
        let Some(doc_id) = value.as_str() else {
            report
                .skipped
                .push((raw_path.clone(), "document id is not a string".into()));
            continue;
        };
        if doc_id == UNFILLED_ID || doc_id.is_empty() {
            report
                .skipped
                .push((raw_path.clone(), "no document id filled in".into()));
            continue;
        }

        let file = base_dir.join(raw_path);
        let key = match relative_key(root, &file) {
            Ok(key) => key,
            Err(err) => {
                warn!(path = %raw_path, error = %err, "Skipping mapping outside the project");
                report.skipped.push((raw_path.clone(), err.to_string()));
                continue;
            }
        };

        let pending = doc_id == PENDING_CREATION;
        let local_content_hash = if file.is_file() {
            Some(compute_file_checksum(&file)?)
        } else {
            None
        };

        let mut patch = EntryPatch {
            source: Some(source.to_string()),
            local_content_hash,
            ..Default::default()
        };
        if pending {
            patch.status = Some(DocStatus::New);
        } else {
            patch.status = Some(DocStatus::Active);
            patch.remote_doc_id = Some(doc_id.to_string());
        }
        registry.upsert(&key, patch)?;
        debug!(path = %key, doc_id, "Imported mapping entry");
        report.imported.push(key);
    }

    Ok(report)
}
