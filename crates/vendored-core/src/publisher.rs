//! Publishing install results as a pull request.

use vendored_host::{PullRequest, PullRequestOutcome, SourceControl, SourceHost};

use crate::descriptor::default_install_branch;
use crate::{InstallResult, Registry, Result};

/// Branch used when several vendors change at once.
pub const MULTI_VENDOR_BRANCH: &str = "chore/install-vendors";

const DEFAULT_BASE: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrMetadata {
    pub branch: String,
    pub title: String,
    pub body: String,
    pub automerge: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// No result changed anything.
    NoVendorChanges,
    /// Results claimed changes but nothing ended up staged.
    NoChangesToCommit,
    /// A pull request from the same branch is already open.
    AlreadyExists { branch: String },
    Created { url: String, automerge: bool },
}

/// Branch, title and body for the changed subset of `results`.
///
/// One changed vendor publishes on `<install_branch>-v<version>` and honors
/// its `automerge` flag; several share one branch and never auto-merge.
pub fn get_pr_metadata(results: &[InstallResult], registry: &Registry) -> Option<PrMetadata> {
    let changed: Vec<&InstallResult> = results.iter().filter(|r| r.changed).collect();
    match changed.as_slice() {
        [] => None,
        [result] => {
            let descriptor = registry.get(&result.vendor);
            let install_branch = descriptor
                .map(|d| d.install_branch_or_default(&result.vendor))
                .unwrap_or_else(|| default_install_branch(&result.vendor));
            Some(PrMetadata {
                branch: format!("{install_branch}-v{}", result.new_version),
                title: format!("chore: install {} v{}", result.vendor, result.new_version),
                body: format!(
                    "Updates **{}** from `{}` to `{}`.",
                    result.vendor, result.old_version, result.new_version
                ),
                automerge: descriptor.is_some_and(|d| d.automerge),
            })
        }
        many => {
            let title = many
                .iter()
                .map(|r| format!("{} v{}", r.vendor, r.new_version))
                .collect::<Vec<_>>()
                .join(", ");
            let body = many
                .iter()
                .map(|r| format!("- **{}**: `{}` -> `{}`", r.vendor, r.old_version, r.new_version))
                .collect::<Vec<_>>()
                .join("\n");
            Some(PrMetadata {
                branch: MULTI_VENDOR_BRANCH.to_string(),
                title: format!("chore: install {title}"),
                body: format!("Updates vendored tools:\n\n{body}"),
                automerge: false,
            })
        }
    }
}

/// Commits the working tree on a fresh branch and opens a pull request.
pub struct PrPublisher<'a> {
    scm: &'a dyn SourceControl,
    host: &'a dyn SourceHost,
}

impl<'a> PrPublisher<'a> {
    pub fn new(scm: &'a dyn SourceControl, host: &'a dyn SourceHost) -> Self {
        Self { scm, host }
    }

    pub fn publish(
        &self,
        results: &[InstallResult],
        registry: &Registry,
        token: Option<&str>,
    ) -> Result<PublishOutcome> {
        let Some(meta) = get_pr_metadata(results, registry) else {
            tracing::info!("No vendor changes");
            return Ok(PublishOutcome::NoVendorChanges);
        };

        let base = self
            .scm
            .current_branch()?
            .unwrap_or_else(|| DEFAULT_BASE.to_string());
        self.scm.create_branch(&meta.branch)?;
        self.scm.stage_all()?;
        if !self.scm.has_staged_changes()? {
            tracing::info!("No changes to commit");
            return Ok(PublishOutcome::NoChangesToCommit);
        }
        self.scm.commit(&meta.title)?;
        self.scm.push(&meta.branch)?;

        let request = PullRequest {
            base,
            head: meta.branch.clone(),
            title: meta.title.clone(),
            body: meta.body.clone(),
        };
        match self.host.create_pull_request(&request, token)? {
            PullRequestOutcome::AlreadyExists => {
                tracing::info!(branch = %meta.branch, "PR already exists");
                Ok(PublishOutcome::AlreadyExists { branch: meta.branch })
            }
            PullRequestOutcome::Created { url } => {
                tracing::info!(%url, "Opened pull request");
                if meta.automerge {
                    self.host.merge(&url, token)?;
                }
                Ok(PublishOutcome::Created {
                    url,
                    automerge: meta.automerge,
                })
            }
        }
    }
}
