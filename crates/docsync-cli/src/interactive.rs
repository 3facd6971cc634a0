//! Interactive prompts for CLI commands
//!
//! Uses dialoguer for terminal-based selection. A prompt that fails (closed
//! stdin, interrupted terminal) falls back to the safe choice for that
//! question, which never discards content.

use colored::Colorize;
use dialoguer::{Confirm, Input, Select};
use docsync_core::sync::{LocalMissingDecision, RemoteIssue, RemoteMissingDecision};
use docsync_core::{
    DocumentEntry, RemoteMetadata, ResolutionDecision, ResolutionPolicy, TargetFolder,
};
use tracing::warn;

const LOCAL_MISSING_CHOICES: &[&str] = &[
    "Skip (leave as is)",
    "Remove the entry from the registry",
    "Unlink the remote document",
    "Abort the pass",
];

const REMOTE_MISSING_CHOICES: &[&str] = &[
    "Skip (leave as is)",
    "Create a new remote document and relink",
    "Unlink the remote document",
    "Abort the pass",
];

const CONFLICT_CHOICES: &[&str] = &[
    "Skip (leave the conflict)",
    "Push local changes over the remote",
    "Pull the remote text over the local file",
    "Abort the pass",
];

/// A [`ResolutionPolicy`] that asks the operator on the terminal.
#[derive(Debug, Default)]
pub struct PromptPolicy;

impl PromptPolicy {
    pub fn new() -> Self {
        Self
    }
}

fn select(prompt: &str, items: &[&str]) -> usize {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Prompt failed, skipping");
            0
        })
}

fn confirm(prompt: &str) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

impl ResolutionPolicy for PromptPolicy {
    fn on_local_missing(&mut self, entry: &DocumentEntry) -> LocalMissingDecision {
        println!();
        println!(
            "{} Local file {} is missing.",
            "!".yellow().bold(),
            entry.local_path.cyan()
        );
        match select("What should happen to this entry?", LOCAL_MISSING_CHOICES) {
            1 => LocalMissingDecision::RemoveEntry,
            2 => LocalMissingDecision::UnlinkRemote,
            3 => LocalMissingDecision::Abort,
            _ => LocalMissingDecision::Skip,
        }
    }

    fn on_remote_missing(
        &mut self,
        entry: &DocumentEntry,
        issue: RemoteIssue,
    ) -> RemoteMissingDecision {
        let what = match issue {
            RemoteIssue::NotFound => "was not found",
            RemoteIssue::Trashed => "is in the trash",
        };
        println!();
        println!(
            "{} Remote document {} for {} {}.",
            "!".yellow().bold(),
            entry.remote_doc_id.as_deref().unwrap_or("?").dimmed(),
            entry.local_path.cyan(),
            what
        );
        match select("How should the link be repaired?", REMOTE_MISSING_CHOICES) {
            1 => RemoteMissingDecision::CreateNew,
            2 => RemoteMissingDecision::Unlink,
            3 => RemoteMissingDecision::Abort,
            _ => RemoteMissingDecision::Skip,
        }
    }

    fn on_conflict(&mut self, entry: &DocumentEntry, live: &RemoteMetadata) -> ResolutionDecision {
        let modified = live
            .modified_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "at an unknown time".to_string());
        println!();
        println!(
            "{} {} changed locally and remotely (remote revision {}, modified {}).",
            "CONFLICT".red().bold(),
            entry.local_path.cyan(),
            live.version,
            modified
        );
        match select("Which side wins?", CONFLICT_CHOICES) {
            1 => ResolutionDecision::PushLocal,
            2 => ResolutionDecision::PullRemote,
            3 => ResolutionDecision::Abort,
            _ => ResolutionDecision::Skip,
        }
    }

    fn adopt_local_hash(&mut self, entry: &DocumentEntry, _current_hash: &str) -> bool {
        confirm(&format!(
            "{} has unpushed local changes. Record the current file as synced?",
            entry.local_path
        ))
    }

    fn adopt_remote_version(&mut self, entry: &DocumentEntry, live: &RemoteMetadata) -> bool {
        confirm(&format!(
            "The remote copy of {} is at revision {}. Record it as synced?",
            entry.local_path, live.version
        ))
    }

    fn choose_target_folder(&mut self) -> Option<TargetFolder> {
        println!();
        println!("{} No target folder is configured for new documents.", "?".blue().bold());
        let id: String = Input::new()
            .with_prompt("Folder id (empty for none)")
            .allow_empty(true)
            .interact_text()
            .unwrap_or_default();
        let id = id.trim();
        if id.is_empty() {
            return None;
        }
        let name: String = Input::new()
            .with_prompt("Folder name")
            .allow_empty(true)
            .interact_text()
            .unwrap_or_default();
        Some(TargetFolder::new(name.trim(), id))
    }
}

/// Ask before unregistering a document.
pub fn confirm_remove(path: &str) -> crate::error::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!("Unregister {path}? The remote document is kept."))
        .default(false)
        .interact()?)
}
