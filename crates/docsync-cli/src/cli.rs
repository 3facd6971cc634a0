//! CLI argument parsing using clap derive

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use docsync_core::DocStatus;

/// docsync - Keep local documents in step with a remote document service
#[derive(Parser, Debug)]
#[command(name = "docsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Reconcile every registered document with the remote
    ///
    /// Examples:
    ///   docsync sync                       # Unattended pass
    ///   docsync sync --interactive         # Prompt on conflicts and stale links
    ///   docsync sync --folder abc123       # Create new documents in folder abc123
    Sync {
        /// Create a new remote document for every inaccessible link
        #[arg(long)]
        force_recreate: bool,

        /// Target folder id for newly created documents (not stored)
        #[arg(long, env = "DOCSYNC_FOLDER")]
        folder: Option<String>,

        /// Display name for the --folder override
        #[arg(long, requires = "folder")]
        folder_name: Option<String>,

        /// Push and pull text exactly as stored, without escape cleanup
        #[arg(long)]
        no_clean: bool,

        /// Ask the operator how to resolve conflicts and stale links
        #[arg(short, long)]
        interactive: bool,
    },

    /// Report the health of every registered document
    Check {
        /// Offer metadata repairs for problems found
        #[arg(long)]
        repair: bool,
    },

    /// Register a document
    Add {
        /// Path of the document inside the project
        file: PathBuf,

        /// Priority tier
        #[arg(long)]
        tier: Option<i64>,

        /// Where the registration came from
        #[arg(long, default_value = "manual_add")]
        source: String,
    },

    /// Unregister a document (the remote copy is kept)
    Remove {
        /// Path of the document inside the project
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Edit a registered document's metadata
    Update {
        /// Path of the document inside the project
        file: PathBuf,

        #[arg(long)]
        tier: Option<i64>,

        #[arg(long)]
        source: Option<String>,

        /// New status, e.g. active or local_only
        #[arg(long, value_parser = DocStatus::from_str)]
        status: Option<DocStatus>,
    },

    /// List registered documents
    List,

    /// Import a legacy path-to-document-id mapping file
    Import {
        /// JSON mapping file
        mapping: PathBuf,

        #[arg(long, default_value = "migrated_sync_config")]
        source: String,
    },
}
