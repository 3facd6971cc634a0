//! Sync and check command implementations

use std::io::IsTerminal;
use std::path::Path;

use colored::Colorize;
use docsync_core::sync::{HealthReport, HealthState, SyncCounts};
use docsync_core::{
    EntryOutcome, NonInteractivePolicy, ResolutionPolicy, SyncContext, SyncOrchestrator,
    TargetFolder,
};
use tracing::debug;

use super::{report_load_status, status_label};
use crate::context::ProjectContext;
use crate::error::{CliError, Result};
use crate::interactive::PromptPolicy;

/// Flags of the sync command.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub force_recreate: bool,
    pub folder: Option<String>,
    pub folder_name: Option<String>,
    pub no_clean: bool,
    pub interactive: bool,
}

fn policy(interactive: bool) -> Result<Box<dyn ResolutionPolicy>> {
    if !interactive {
        return Ok(Box::new(NonInteractivePolicy::default()));
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::user(
            "--interactive needs a terminal; run without it for an unattended pass",
        ));
    }
    Ok(Box::new(PromptPolicy::new()))
}

/// Run the sync command
pub fn run_sync(cwd: &Path, opts: SyncOptions) -> Result<bool> {
    let project = ProjectContext::detect(cwd)?;
    let mut policy = policy(opts.interactive)?;

    println!("{} Synchronizing documents...", "=>".blue().bold());

    let mut ctx = SyncContext::new(&project.root)
        .with_force_recreate(opts.force_recreate)
        .with_clean_content(!opts.no_clean);
    if let Some(id) = opts.folder {
        let name = opts.folder_name.unwrap_or_else(|| id.clone());
        ctx = ctx.with_target_folder(TargetFolder::new(name, id));
    }

    let remote = project.remote();
    let orchestrator = SyncOrchestrator::new(&remote, project.store(), ctx);
    let run = orchestrator.sync(policy.as_mut())?;
    report_load_status(&run.load_status);

    let report = run.report;
    if let Some(folder) = &report.target_folder {
        debug!(id = %folder.id, "Target folder");
    }
    for (path, outcome) in &report.outcomes {
        print_outcome(path, outcome);
    }
    print_summary(&report.counts);

    if report.aborted {
        println!("{} Pass aborted; results so far were saved.", "ABORTED".red().bold());
    }
    if !report.unresolved.is_empty() {
        println!();
        println!("{} Needs attention:", "!".red().bold());
        for (path, status) in &report.unresolved {
            println!("   {} {} ({})", "-".red(), path.cyan(), status_label(*status));
        }
    }
    if report.outcomes.is_empty() {
        println!("{} No documents registered.", "OK".green().bold());
    }
    Ok(!report.has_unresolved())
}

fn print_outcome(path: &str, outcome: &EntryOutcome) {
    let marker = match outcome {
        EntryOutcome::Unchanged => "=".dimmed(),
        EntryOutcome::Pushed | EntryOutcome::Created | EntryOutcome::Pulled => "+".green(),
        EntryOutcome::RemoteChanged | EntryOutcome::Skipped | EntryOutcome::Unlinked => {
            "~".yellow()
        }
        EntryOutcome::Removed => "-".yellow(),
        EntryOutcome::Conflict
        | EntryOutcome::LocalMissing
        | EntryOutcome::Failed(_)
        | EntryOutcome::Aborted => "!".red(),
    };
    println!("   {} {}: {}", marker, path.cyan(), outcome);
}

fn print_summary(counts: &SyncCounts) {
    println!();
    println!(
        "{} synced {} (created {}, pushed {}, pulled {}, unchanged {}), remote changed {}, conflicts {}, skipped {}, failed {}",
        "Summary:".bold(),
        counts.synced(),
        counts.created,
        counts.pushed,
        counts.pulled,
        counts.unchanged,
        counts.remote_changed,
        counts.conflicts,
        counts.skipped + counts.removed + counts.unlinked,
        counts.failed + counts.local_missing
    );
}

/// Run the check command
pub fn run_check(cwd: &Path, repair: bool) -> Result<bool> {
    let project = ProjectContext::detect(cwd)?;
    let mut policy = policy(repair)?;

    println!("{} Checking document health...", "=>".blue().bold());

    let remote = project.remote();
    let orchestrator =
        SyncOrchestrator::new(&remote, project.store(), SyncContext::new(&project.root));
    let run = if repair {
        orchestrator.check(Some(policy.as_mut()))?
    } else {
        orchestrator.check(None)?
    };
    report_load_status(&run.load_status);

    print_health(&run.report);
    if run.saved {
        debug!("Registry statuses updated");
    }
    Ok(run.report.is_healthy())
}

fn print_health(report: &HealthReport) {
    for finding in &report.findings {
        let marker = match finding.state {
            HealthState::Synced => "OK".green(),
            HealthState::Unlinked | HealthState::LocalChanged | HealthState::RemoteChanged => {
                "--".yellow()
            }
            _ => "!!".red(),
        };
        println!(
            "   {} {}: {} [{}]",
            marker,
            finding.path.cyan(),
            finding.state,
            status_label(finding.status)
        );
        for action in &finding.repairs {
            println!("      {} {:?}", "repaired:".green(), action);
        }
    }

    let c = &report.counts;
    println!();
    println!(
        "{} {} documents: {} in sync, {} unlinked, {} local changes, {} remote changes, {} conflicts, {} local missing, {} remote inaccessible, {} errors",
        "Summary:".bold(),
        c.total,
        c.synced,
        c.unlinked,
        c.local_changed,
        c.remote_changed,
        c.conflict,
        c.local_missing,
        c.remote_inaccessible,
        c.errors
    );
    if report.is_healthy() {
        println!("{} All documents are healthy.", "OK".green().bold());
    } else {
        println!(
            "Run {} to review repairs.",
            "docsync check --repair".cyan()
        );
    }
}
