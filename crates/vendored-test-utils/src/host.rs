//! In-memory [`SourceHost`].
//!
//! Repositories, releases and files are declared up front; pull request and
//! merge calls are recorded for later assertions.

use std::cell::RefCell;
use std::collections::BTreeMap;

use vendored_host::{PullRequest, PullRequestOutcome, Result, SourceHost};

#[derive(Debug, Clone, Default)]
struct FakeRepo {
    release: Option<String>,
    /// Keyed by (ref, path); `None` is the default ref.
    files: BTreeMap<(Option<String>, String), Vec<u8>>,
}

/// A source host backed by maps.
///
/// # Example
///
/// ```rust
/// use vendored_test_utils::FakeHost;
/// use vendored_host::SourceHost;
///
/// let host = FakeHost::new().publish("owner/tool", "1.0.0", "#!/bin/bash\n");
/// assert!(host.repo_exists("owner/tool", None).unwrap());
/// assert_eq!(host.latest_release_tag("owner/tool", None).unwrap().as_deref(), Some("v1.0.0"));
/// ```
#[derive(Debug)]
pub struct FakeHost {
    repos: RefCell<BTreeMap<String, FakeRepo>>,
    pr_outcome: RefCell<PullRequestOutcome>,
    pull_requests: RefCell<Vec<PullRequest>>,
    merges: RefCell<Vec<String>>,
    tokens: RefCell<Vec<Option<String>>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            repos: RefCell::new(BTreeMap::new()),
            pr_outcome: RefCell::new(PullRequestOutcome::Created {
                url: "https://github.com/owner/host/pull/1".to_string(),
            }),
            pull_requests: RefCell::new(Vec::new()),
            merges: RefCell::new(Vec::new()),
            tokens: RefCell::new(Vec::new()),
        }
    }

    fn with_repo(self, repo: &str, edit: impl FnOnce(&mut FakeRepo)) -> Self {
        edit(self.repos.borrow_mut().entry(repo.to_ascii_lowercase()).or_default());
        self
    }

    /// Declare an empty repository.
    pub fn repo(self, repo: &str) -> Self {
        self.with_repo(repo, |_| {})
    }

    pub fn release(self, repo: &str, tag: &str) -> Self {
        self.with_repo(repo, |r| r.release = Some(tag.to_string()))
    }

    /// Put `content` at `path`, at `reference` or the default ref.
    pub fn file(self, repo: &str, reference: Option<&str>, path: &str, content: &str) -> Self {
        self.with_repo(repo, |r| {
            r.files.insert(
                (reference.map(str::to_string), path.to_string()),
                content.as_bytes().to_vec(),
            );
        })
    }

    /// A repository with a `v<version>` release whose install script is
    /// `script`, at both the tag and the default ref.
    pub fn publish(self, repo: &str, version: &str, script: &str) -> Self {
        let tag = format!("v{version}");
        self.release(repo, &tag)
            .file(repo, None, "install.sh", script)
            .file(repo, Some(&tag), "install.sh", script)
    }

    /// Declare `deps.json` at `v<version>`.
    pub fn deps(self, repo: &str, version: &str, json: &str) -> Self {
        let tag = format!("v{version}");
        self.file(repo, Some(&tag), "deps.json", json)
    }

    /// Answer the next pull request creation with `outcome`.
    pub fn pr_outcome(self, outcome: PullRequestOutcome) -> Self {
        *self.pr_outcome.borrow_mut() = outcome;
        self
    }

    pub fn pull_requests(&self) -> Vec<PullRequest> {
        self.pull_requests.borrow().clone()
    }

    pub fn merges(&self) -> Vec<String> {
        self.merges.borrow().clone()
    }

    /// Every token passed to a query, in call order.
    pub fn tokens_seen(&self) -> Vec<Option<String>> {
        self.tokens.borrow().clone()
    }

    fn saw(&self, token: Option<&str>) {
        self.tokens.borrow_mut().push(token.map(str::to_string));
    }

    fn lookup(&self, repo: &str, path: &str, reference: Option<&str>) -> Option<Vec<u8>> {
        let repos = self.repos.borrow();
        repos
            .get(&repo.to_ascii_lowercase())?
            .files
            .get(&(reference.map(str::to_string), path.to_string()))
            .cloned()
    }
}

impl SourceHost for FakeHost {
    fn repo_exists(&self, repo: &str, token: Option<&str>) -> Result<bool> {
        self.saw(token);
        Ok(self.repos.borrow().contains_key(&repo.to_ascii_lowercase()))
    }

    fn latest_release_tag(&self, repo: &str, token: Option<&str>) -> Result<Option<String>> {
        self.saw(token);
        Ok(self
            .repos
            .borrow()
            .get(&repo.to_ascii_lowercase())
            .and_then(|r| r.release.clone()))
    }

    fn file_exists(&self, repo: &str, path: &str, token: Option<&str>) -> Result<bool> {
        self.saw(token);
        Ok(self.lookup(repo, path, None).is_some())
    }

    fn file_at_ref(
        &self,
        repo: &str,
        path: &str,
        reference: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<Vec<u8>>> {
        self.saw(token);
        Ok(self.lookup(repo, path, reference))
    }

    fn create_pull_request(
        &self,
        request: &PullRequest,
        _token: Option<&str>,
    ) -> Result<PullRequestOutcome> {
        self.pull_requests.borrow_mut().push(request.clone());
        Ok(self.pr_outcome.borrow().clone())
    }

    fn merge(&self, pr: &str, _token: Option<&str>) -> Result<()> {
        self.merges.borrow_mut().push(pr.to_string());
        Ok(())
    }
}
