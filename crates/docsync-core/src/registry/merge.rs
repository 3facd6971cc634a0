//! Default-then-overlay merge for loaded registry records

use serde_json::{Map, Value};

/// Top-level keys renamed since the first registry format.
const REGISTRY_RENAMES: &[(&str, &str)] = &[("document_registry", "entries")];

const PROJECT_STATE_RENAMES: &[(&str, &str)] = &[("registry_version", "schema_version")];

const PREFERENCES_RENAMES: &[(&str, &str)] = &[("google_drive_folder", "target_folder")];

const ENTRY_RENAMES: &[(&str, &str)] = &[
    ("google_doc_id", "remote_doc_id"),
    ("local_sha256_hash", "local_content_hash"),
    ("google_doc_version", "remote_version"),
    ("google_doc_last_known_good_at", "remote_last_known_good_at"),
];

/// Overlay `top` onto `base`.
///
/// Objects merge key by key, recursively. Any other value in `top`
/// replaces the one in `base`, except `null`, which never erases a
/// non-null default. Keys only present in `top` are carried over.
pub fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base_map), Value::Object(top_map)) => {
            for (key, value) in top_map {
                match base_map.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, Value::Null) if !base.is_null() => {}
        (base, top) => *base = top,
    }
}

fn rename_keys(map: &mut Map<String, Value>, renames: &[(&str, &str)]) {
    for (old, new) in renames {
        if let Some(value) = map.remove(*old) {
            // The current name wins when a file somehow carries both.
            map.entry(new.to_string()).or_insert(value);
        }
    }
}

fn rename_nested(map: &mut Map<String, Value>, key: &str, renames: &[(&str, &str)]) {
    if let Some(Value::Object(inner)) = map.get_mut(key) {
        rename_keys(inner, renames);
    }
}

/// Rewrite legacy field names in a raw registry document to current ones.
pub fn rename_legacy_keys(raw: &mut Value) {
    let Value::Object(root) = raw else {
        return;
    };
    rename_keys(root, REGISTRY_RENAMES);
    rename_nested(root, "project_state", PROJECT_STATE_RENAMES);
    rename_nested(root, "sync_preferences", PREFERENCES_RENAMES);

    if let Some(Value::Object(entries)) = root.get_mut("entries") {
        for entry in entries.values_mut() {
            if let Value::Object(fields) = entry {
                rename_keys(fields, ENTRY_RENAMES);
            }
        }
    }
}
