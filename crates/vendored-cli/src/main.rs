//! vendored CLI
//!
//! Installs, updates, removes and validates vendored tool bundles, and
//! guards their files in a pre-commit hook.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use vendored_host::GhCli;

use cli::{Cli, Commands};
use commands::InstallRequest;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        if let Some(hint) = e.hint() {
            eprintln!("{} {}", "hint:".cyan().bold(), hint);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir()?;
    let host = GhCli::new(&cwd).with_program(&cli.gh);

    match cli.command {
        Commands::Install {
            target,
            reference,
            name,
            force,
            deps,
            pr,
        } => {
            let request = InstallRequest {
                target,
                reference,
                name,
                force,
                deps,
                pr,
            };
            commands::run_install(&cwd, &host, &request)
        }
        Commands::Remove { vendor, force } => commands::run_remove(&cwd, &vendor, force),
        Commands::Check { install_hook } => commands::run_check(&cwd, install_hook),
        Commands::Validate { repo, reference } => {
            commands::run_validate(&host, &repo, reference.as_deref())
        }
    }
}

/// Logs go to stderr; stdout carries results.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
    tracing::debug!("Verbose mode enabled");
}
