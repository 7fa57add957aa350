//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use vendored_core::DependencyMode;

/// vendored - Install and guard tool bundles vendored from other repositories
#[derive(Parser, Debug)]
#[command(name = "vendored")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Executable used to talk to the source host
    #[arg(long, global = true, env = "VENDORED_GH", default_value = "gh", hide = true)]
    pub gh: String,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Install a new vendor, update an existing one, or update all
    ///
    /// Examples:
    ///   vendored install owner/tool            # Add a new vendor
    ///   vendored install tool --version 2.0.0  # Update one vendor
    ///   vendored install all --pr              # Update everything and open a PR
    Install {
        /// `owner/name` repository, registered vendor name, or `all`
        target: String,

        /// Version or ref to install (defaults to the latest)
        #[arg(long = "version", value_name = "REF")]
        reference: Option<String>,

        /// Local name for a newly installed vendor
        #[arg(long)]
        name: Option<String>,

        /// Re-run the install script even when already at the target version
        #[arg(short, long)]
        force: bool,

        /// How to treat declared dependencies that are not installed
        #[arg(long, value_name = "MODE", value_parser = parse_dependency_mode)]
        deps: Option<DependencyMode>,

        /// Commit the result on a branch and open a pull request
        #[arg(long)]
        pr: bool,
    },

    /// Remove a vendor and every file its manifest lists
    Remove {
        /// Registered vendor name
        vendor: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Reject staged edits to protected files (pre-commit gate)
    Check {
        /// Link .git/hooks/pre-commit to the vendored hook instead of checking
        #[arg(long)]
        install_hook: bool,
    },

    /// Dry-run a repository's install script in isolation
    Validate {
        /// `owner/name` repository to validate
        repo: String,

        /// Version or ref to validate (defaults to the latest)
        #[arg(long = "version", value_name = "REF")]
        reference: Option<String>,
    },
}

fn parse_dependency_mode(value: &str) -> Result<DependencyMode, String> {
    value.parse().map_err(|e: vendored_core::Error| e.to_string())
}
