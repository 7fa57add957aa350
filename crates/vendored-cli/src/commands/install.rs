//! The `install` command
//!
//! Routes the target to a new install (`owner/name`), an update of one
//! registered vendor, or an update of all of them. Results are printed as
//! `key=value` lines, mirrored to `$GITHUB_OUTPUT`, and optionally published
//! as a pull request.

use std::path::Path;

use colored::Colorize;
use vendored_core::{
    ConfigMigrator, DependencyMode, Error, InstallOptions, InstallResult, Installer,
    InstallingSet, PrPublisher, PublishOutcome, Registry, RegistryStore, auth, results,
};
use vendored_fs::ControlLayout;
use vendored_host::{GitRepository, SourceHost};

use crate::context;
use crate::error::{CliError, Result};

/// Arguments of one `install` invocation.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub target: String,
    pub reference: Option<String>,
    pub name: Option<String>,
    pub force: bool,
    pub deps: Option<DependencyMode>,
    pub pr: bool,
}

/// What an install target names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target<'a> {
    All,
    Repo(&'a str),
    Vendor(&'a str),
}

impl<'a> Target<'a> {
    pub fn parse(target: &'a str) -> Self {
        if target == "all" {
            Self::All
        } else if target.contains('/') {
            Self::Repo(target)
        } else {
            Self::Vendor(target)
        }
    }
}

pub fn run_install(cwd: &Path, host: &dyn SourceHost, request: &InstallRequest) -> Result<()> {
    let target = Target::parse(&request.target);
    if request.name.is_some() && !matches!(target, Target::Repo(_)) {
        return Err(CliError::user(
            "--name only applies when installing a new vendor from owner/name",
        ));
    }
    if request.reference.is_some() && target == Target::All {
        return Err(CliError::user(
            "--version cannot be combined with `install all`; every vendor updates to its latest version",
        ));
    }

    let layout = context::locate(cwd)?;
    let migrations = ConfigMigrator::new(layout.clone()).run_pending()?;
    if migrations > 0 {
        println!(
            "{} Applied {} config migration(s)",
            "=>".blue().bold(),
            migrations
        );
    }

    let store = RegistryStore::new(layout.clone());
    let registry = store.load()?;
    let options = InstallOptions {
        reference: request.reference.clone(),
        name: request.name.clone(),
        force: request.force,
        dep_mode: DependencyMode::resolve(request.deps, &registry)?,
    };
    let installer = Installer::new(layout.clone(), host);

    let outcomes = match target {
        Target::All => installer.install_all(&options)?,
        Target::Repo(repo) => {
            let token = auth::token_for(None)?;
            let mut installing = InstallingSet::new();
            vec![installer.install_new_vendor(repo, &options, token.as_deref(), &mut installing)?]
        }
        Target::Vendor(name) => {
            let Some(descriptor) = registry.get(name) else {
                return Err(Error::UnknownVendor {
                    name: name.to_string(),
                    known: registry.names(),
                }
                .into());
            };
            let token = auth::token_for(Some((name, descriptor)))?;
            vec![installer.install_existing_vendor(name, descriptor, &options, token.as_deref())?]
        }
    };

    let registry = store.load()?;
    print_summary(&outcomes);

    let outputs = results::outputs_for(&outcomes, &registry);
    print!("{}", results::render(&outputs));
    if let Some(path) = results::github_output_path() {
        results::append_outputs(&path, &outputs)?;
    }

    if request.pr {
        publish(&layout, host, &outcomes, &registry)?;
    }
    Ok(())
}

fn print_summary(outcomes: &[InstallResult]) {
    for result in outcomes {
        if result.changed {
            println!(
                "{} {} {} -> {}",
                "=>".blue().bold(),
                result.vendor.bold(),
                result.old_version,
                result.new_version.green()
            );
        } else {
            println!(
                "{} {} already at {}",
                "=>".blue().bold(),
                result.vendor.bold(),
                result.new_version
            );
        }
    }
}

fn publish(
    layout: &ControlLayout,
    host: &dyn SourceHost,
    outcomes: &[InstallResult],
    registry: &Registry,
) -> Result<()> {
    let scm = GitRepository::open(&layout.root().to_native())?;
    let token = auth::publish_token();
    let outcome = PrPublisher::new(&scm, host).publish(outcomes, registry, token.as_deref())?;

    match outcome {
        PublishOutcome::NoVendorChanges => {
            println!("{} No vendor changes, no pull request needed", "note:".yellow().bold());
        }
        PublishOutcome::NoChangesToCommit => {
            println!("{} No changes to commit", "note:".yellow().bold());
        }
        PublishOutcome::AlreadyExists { branch } => {
            println!(
                "{} A pull request for {} already exists",
                "note:".yellow().bold(),
                branch.cyan()
            );
        }
        PublishOutcome::Created { url, automerge } => {
            println!("{} Opened {}", "=>".blue().bold(), url);
            if automerge {
                println!("   {}", "auto-merge enabled".dimmed());
            }
        }
    }
    Ok(())
}
