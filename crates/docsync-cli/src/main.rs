//! docsync CLI
//!
//! Registers local documents and keeps them in step with their remote
//! counterparts.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::SyncOptions;
use error::Result;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} document sync", "docsync".green().bold());
            println!();
            println!("Run {} for available commands.", "docsync --help".cyan());
            Ok(true)
        }
    }
}

fn execute_command(cmd: Commands) -> Result<bool> {
    let cwd = std::env::current_dir()?;
    match cmd {
        Commands::Sync {
            force_recreate,
            folder,
            folder_name,
            no_clean,
            interactive,
        } => commands::run_sync(
            &cwd,
            SyncOptions {
                force_recreate,
                folder,
                folder_name,
                no_clean,
                interactive,
            },
        ),
        Commands::Check { repair } => commands::run_check(&cwd, repair),
        Commands::Add { file, tier, source } => commands::run_add(&cwd, &file, tier, &source),
        Commands::Remove { file, yes } => commands::run_remove(&cwd, &file, yes),
        Commands::Update {
            file,
            tier,
            source,
            status,
        } => commands::run_update(&cwd, &file, tier, source, status),
        Commands::List => commands::run_list(&cwd),
        Commands::Import { mapping, source } => commands::run_import(&cwd, &mapping, &source),
    }
}
