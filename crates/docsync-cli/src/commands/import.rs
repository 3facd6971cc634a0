//! Import a legacy path-to-document-id mapping

use std::path::Path;

use colored::Colorize;
use docsync_core::import_mapping;
use docsync_fs::io;
use serde_json::Value;

use super::report_load_status;
use crate::context::ProjectContext;
use crate::error::Result;

/// Run the import command
///
/// Paths in the mapping resolve against the mapping file's directory.
pub fn run_import(cwd: &Path, mapping: &Path, source: &str) -> Result<bool> {
    let project = ProjectContext::detect(cwd)?;
    let mapping_path = if mapping.is_absolute() {
        mapping.to_path_buf()
    } else {
        cwd.join(mapping)
    };
    let value: Value = serde_json::from_str(&io::read_text(&mapping_path)?)?;
    let base_dir = mapping_path.parent().unwrap_or(&project.root).to_path_buf();

    let store = project.store();
    let (mut registry, status) = store.load_with_status()?;
    report_load_status(&status);

    let report = import_mapping(&project.root, &base_dir, &mut registry, &value, source)?;
    store.save(&mut registry)?;

    for key in &report.imported {
        println!("   {} {}", "+".green(), key.cyan());
    }
    for (key, reason) in &report.skipped {
        println!("   {} {} ({})", "~".yellow(), key, reason.dimmed());
    }
    if let Some(folder) = &report.folder {
        println!("Target folder set to {} ({})", folder.name, folder.id.dimmed());
    }
    println!(
        "{} Imported {} entries, skipped {}",
        "OK".green().bold(),
        report.imported.len(),
        report.skipped.len()
    );
    Ok(true)
}
