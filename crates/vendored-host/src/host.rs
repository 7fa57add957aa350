//! Source Host interface

use crate::Result;

/// Pull request to open on the source host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub base: String,
    pub head: String,
    pub title: String,
    pub body: String,
}

/// What the host reported when asked to open a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestOutcome {
    Created { url: String },
    /// A pull request for the same head branch is already open.
    AlreadyExists,
}

/// Queries and mutations against the external code host.
///
/// `repo` is always an `owner/name` identity. `token`, when present, is the
/// credential used for that call; public repositories may be queried without one.
pub trait SourceHost {
    fn repo_exists(&self, repo: &str, token: Option<&str>) -> Result<bool>;

    /// Tag of the latest published release, if any.
    fn latest_release_tag(&self, repo: &str, token: Option<&str>) -> Result<Option<String>>;

    /// Probe for a file at the default ref without downloading it.
    fn file_exists(&self, repo: &str, path: &str, token: Option<&str>) -> Result<bool>;

    /// Contents of `path` at `reference` (default ref when `None`), if present.
    fn file_at_ref(
        &self,
        repo: &str,
        path: &str,
        reference: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<Vec<u8>>>;

    fn create_pull_request(
        &self,
        request: &PullRequest,
        token: Option<&str>,
    ) -> Result<PullRequestOutcome>;

    /// Enable merging of the pull request identified by `pr` (URL or number).
    fn merge(&self, pr: &str, token: Option<&str>) -> Result<()>;
}
