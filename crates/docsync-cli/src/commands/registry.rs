//! Registration commands: add, remove, update, list

use std::path::Path;

use colored::Colorize;
use docsync_core::{DocStatus, EntryPatch, Error as CoreError};
use docsync_fs::{compute_file_checksum, relative_key};

use super::{report_load_status, status_label};
use crate::context::ProjectContext;
use crate::error::{CliError, Result};
use crate::interactive::confirm_remove;

/// Resolve a command-line path to its registry key.
fn registry_key(cwd: &Path, project: &ProjectContext, file: &Path) -> Result<String> {
    let absolute = if file.is_absolute() {
        file.to_path_buf()
    } else {
        cwd.join(file)
    };
    Ok(relative_key(&project.root, &absolute)?)
}

/// Register `file`, or refresh tier and source if it is already tracked.
pub fn run_add(cwd: &Path, file: &Path, tier: Option<i64>, source: &str) -> Result<bool> {
    let project = ProjectContext::detect(cwd)?;
    let key = registry_key(cwd, &project, file)?;
    let full = project.root.join(&key);
    if !full.is_file() {
        return Err(CliError::user(format!("File not found: {}", file.display())));
    }

    let store = project.store();
    let (mut registry, status) = store.load_with_status()?;
    report_load_status(&status);

    let existed = registry.contains(&key);
    let patch = if existed {
        EntryPatch {
            tier,
            source: Some(source.to_string()),
            ..Default::default()
        }
    } else {
        EntryPatch {
            tier,
            source: Some(source.to_string()),
            status: Some(DocStatus::LocalOnly),
            local_content_hash: Some(compute_file_checksum(&full)?),
            ..Default::default()
        }
    };
    registry.upsert(&key, patch)?;
    store.save(&mut registry)?;

    if existed {
        println!("{} Updated {}", "OK".green().bold(), key.cyan());
    } else {
        println!("{} Registered {}", "OK".green().bold(), key.cyan());
    }
    Ok(true)
}

/// Unregister `file`. The remote document is left untouched.
pub fn run_remove(cwd: &Path, file: &Path, yes: bool) -> Result<bool> {
    let project = ProjectContext::detect(cwd)?;
    let key = registry_key(cwd, &project, file)?;

    let store = project.store();
    let (mut registry, status) = store.load_with_status()?;
    report_load_status(&status);

    if !registry.contains(&key) {
        return Err(CoreError::NotTracked { path: key }.into());
    }
    if !yes && !confirm_remove(&key)? {
        println!("Cancelled.");
        return Ok(true);
    }

    let removed = registry.remove(&key)?;
    store.save(&mut registry)?;

    println!("{} Unregistered {}", "OK".green().bold(), key.cyan());
    if let Some(id) = removed.remote_id() {
        println!("   Remote document {} was kept.", id.dimmed());
    }
    Ok(true)
}

/// Edit metadata of a tracked document.
pub fn run_update(
    cwd: &Path,
    file: &Path,
    tier: Option<i64>,
    source: Option<String>,
    status: Option<DocStatus>,
) -> Result<bool> {
    let patch = EntryPatch {
        tier,
        source,
        status,
        ..Default::default()
    };
    if patch.is_empty() {
        return Err(CliError::user(
            "Nothing to update; pass --tier, --source, or --status",
        ));
    }

    let project = ProjectContext::detect(cwd)?;
    let key = registry_key(cwd, &project, file)?;

    let store = project.store();
    let (mut registry, load_status) = store.load_with_status()?;
    report_load_status(&load_status);

    if !registry.contains(&key) {
        return Err(CoreError::NotTracked { path: key }.into());
    }
    let entry = registry.upsert(&key, patch)?;
    let new_status = entry.status;
    store.save(&mut registry)?;

    println!(
        "{} Updated {} [{}]",
        "OK".green().bold(),
        key.cyan(),
        status_label(new_status)
    );
    Ok(true)
}

/// Print every tracked document.
pub fn run_list(cwd: &Path) -> Result<bool> {
    let project = ProjectContext::detect(cwd)?;
    let (registry, status) = project.store().load_with_status()?;
    report_load_status(&status);

    if registry.is_empty() {
        println!("No documents registered.");
        return Ok(true);
    }

    for (path, entry) in registry.iter() {
        let tier = entry
            .tier
            .map(|t| format!("tier {t}"))
            .unwrap_or_else(|| "-".to_string());
        let remote = entry.remote_id().unwrap_or("(no remote)");
        println!(
            "{:<40} {:<24} {:<8} {}",
            path.cyan(),
            status_label(entry.status),
            tier,
            remote.dimmed()
        );
    }
    if let Some(folder) = registry.target_folder() {
        println!();
        println!("Target folder: {} ({})", folder.name, folder.id.dimmed());
    }
    println!();
    println!("{} documents", registry.len());
    Ok(true)
}
