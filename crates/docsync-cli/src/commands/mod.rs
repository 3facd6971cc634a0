//! Command implementations for docsync-cli
//!
//! Each `run_*` returns `Ok(true)` when the command finished cleanly and
//! `Ok(false)` when it completed but left problems that warrant exit 1.

pub mod import;
pub mod registry;
pub mod sync;

use colored::{ColoredString, Colorize};
use docsync_core::{DocStatus, LoadStatus};

pub use import::run_import;
pub use registry::{run_add, run_list, run_remove, run_update};
pub use sync::{SyncOptions, run_check, run_sync};

/// Print a loud warning when the registry had to be rebuilt.
pub(crate) fn report_load_status(status: &LoadStatus) {
    match status {
        LoadStatus::Recovered { backup, reason } => {
            eprintln!(
                "{} The registry was unreadable and has been reset: {}",
                "WARNING".red().bold(),
                reason
            );
            match backup {
                Some(path) => eprintln!("   Previous contents saved to {}", path.display()),
                None => eprintln!(
                    "   {}",
                    "The previous contents could not be backed up and were left in place.".red()
                ),
            }
        }
        LoadStatus::Loaded {
            migrated_from: Some(version),
        } => {
            println!(
                "{} Registry migrated from schema {}",
                "=>".blue().bold(),
                version
            );
        }
        _ => {}
    }
}

pub(crate) fn status_label(status: DocStatus) -> ColoredString {
    let label = status.as_str();
    match status {
        DocStatus::Active => label.green(),
        DocStatus::New | DocStatus::LocalOnly => label.blue(),
        DocStatus::LocalChanged | DocStatus::RemoteChanged => label.yellow(),
        _ => label.red(),
    }
}
